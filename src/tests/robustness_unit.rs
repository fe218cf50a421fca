//! Awkward operation sequences an operator can produce on a busy night:
//! stale ids, repeated terminal actions, removals racing assignments.

use crate::{CoreError, EntryStatus, MatchType, Rotation, Team};
use uuid::Uuid;

fn doubles_rotation() -> (Rotation, [Uuid; 4]) {
    let mut rotation = Rotation::new(Uuid::new_v4(), &[Uuid::new_v4()], true);
    let players = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    for player_id in players {
        rotation.check_in(player_id, None);
    }
    (rotation, players)
}

#[test]
fn test_correct_result_on_active_match_rejected() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], None)
        .unwrap();

    let result = rotation.correct_result(match_id, None, Some(Some(Team::One)));
    assert_eq!(result, Err(CoreError::MatchNotEnded { match_id }));
    // The active match is untouched.
    assert_eq!(rotation.match_record(match_id).unwrap().winner_team, None);
}

#[test]
fn test_end_after_cancel_rejected_and_stats_stay_clean() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], None)
        .unwrap();
    rotation.cancel_match(match_id).unwrap();

    let result = rotation.end_match(match_id, None, Some(Team::One));
    assert_eq!(result, Err(CoreError::MatchNotActive { match_id }));
    for player_id in [a, b, c, d] {
        let player = rotation.player(player_id).unwrap();
        assert_eq!((player.games_played, player.wins, player.losses), (0, 0, 0));
    }
}

#[test]
fn test_removing_entry_after_assignment_does_not_block_cancel_requeue() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let e1 = rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap().id;
    let e2 = rotation.enqueue(MatchType::Doubles, &[c, d]).unwrap().id;
    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], Some(&[e1, e2]))
        .unwrap();

    // Operator removes a consumed entry by mistake, then cancels the match.
    rotation.remove_entry(e1).unwrap();
    rotation.cancel_match(match_id).unwrap();

    // Both teams still come back as fresh entries.
    let queued = rotation.queued_entries();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].player_ids, vec![a, b]);
    assert_eq!(queued[1].player_ids, vec![c, d]);
}

#[test]
fn test_stale_consumed_entry_ids_are_ignored_on_start() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let ghost = Uuid::new_v4();

    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], Some(&[ghost]))
        .unwrap();
    assert!(rotation.match_record(match_id).is_some());
}

#[test]
fn test_explicit_entry_ids_skip_the_intersection_fallback() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    // Two queued entries share players with the match, but only one is
    // named as consumed: the other must stay queued.
    let named = rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap().id;
    let bystander = rotation.enqueue(MatchType::Doubles, &[c, d]).unwrap().id;

    rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], Some(&[named]))
        .unwrap();
    assert_eq!(rotation.queue.iter().find(|e| e.id == named).unwrap().status, EntryStatus::Assigned);
    assert_eq!(rotation.queue.iter().find(|e| e.id == bystander).unwrap().status, EntryStatus::Queued);
}

#[test]
fn test_empty_entry_id_list_falls_back_to_intersection() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let entry = rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap().id;

    rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], Some(&[]))
        .unwrap();
    assert_eq!(rotation.queue.iter().find(|e| e.id == entry).unwrap().status, EntryStatus::Assigned);
}

#[test]
fn test_cancel_requeue_counts_past_removed_positions() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    // Occupy positions 1-3, then remove the tail entry; its position must
    // still not be reused.
    let extra = [Uuid::new_v4(), Uuid::new_v4()];
    rotation.check_in(extra[0], None);
    rotation.check_in(extra[1], None);
    rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap();
    rotation.enqueue(MatchType::Doubles, &[c, d]).unwrap();
    let tail = rotation.enqueue(MatchType::Doubles, &extra).unwrap().id;
    rotation.remove_entry(tail).unwrap();

    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], None)
        .unwrap();
    rotation.cancel_match(match_id).unwrap();

    let queued = rotation.queued_entries();
    assert_eq!(queued.len(), 2);
    assert_eq!(queued[0].position, 4);
    assert_eq!(queued[1].position, 5);
}

#[test]
fn test_double_cancel_rejected() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    let match_id = rotation
        .start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c, d]], None)
        .unwrap();
    rotation.cancel_match(match_id).unwrap();

    assert_eq!(rotation.cancel_match(match_id), Err(CoreError::MatchNotActive { match_id }));
    // One cancellation, one requeue: still exactly two new entries.
    assert_eq!(rotation.queued_entries().len(), 2);
}

#[test]
fn test_failed_start_leaves_rotation_untouched() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let occupancy_id = rotation.courts[0].id;
    rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap();
    rotation.enqueue(MatchType::Doubles, &[c, d]).unwrap();
    let before = rotation.clone();

    // Team size mismatch fails after the queue already has consumable
    // entries; nothing may have been assigned.
    let result = rotation.start_match(occupancy_id, MatchType::Doubles, [vec![a, b], vec![c]], None);
    assert!(result.is_err());
    assert_eq!(rotation.queue, before.queue);
    assert_eq!(rotation.courts, before.courts);
    assert_eq!(rotation.matches, before.matches);
}

#[test]
fn test_suggest_after_partial_reorder_uses_position_as_sort_key() {
    let (mut rotation, [a, b, c, d]) = doubles_rotation();
    let extra = [Uuid::new_v4(), Uuid::new_v4()];
    rotation.check_in(extra[0], None);
    rotation.check_in(extra[1], None);
    let e1 = rotation.enqueue(MatchType::Doubles, &[a, b]).unwrap().id;
    let e2 = rotation.enqueue(MatchType::Doubles, &[c, d]).unwrap().id;
    let e3 = rotation.enqueue(MatchType::Doubles, &extra).unwrap().id;

    // Partial reorder gives e3 position 1, colliding with e1's old 1.
    rotation.reorder_queue(&[e3]).unwrap();

    let suggestion = rotation.suggest(MatchType::Doubles).unwrap();
    // Manual mode, position order: e1 and e3 share position 1 and the
    // stable sort keeps e1 (created first) ahead; e2 at position 2 waits.
    assert_eq!(suggestion.entry_ids, [e1, e3]);
    assert!(!suggestion.entry_ids.contains(&e2));
}
