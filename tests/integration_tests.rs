//! End-to-end rotation night through the public manager API: check-ins,
//! queueing, suggestion, matches, corrections and the leaderboard.

use openplay::{
    CheckoutStatus, CoreError, CourtStatus, ManagerError, MatchStatus, MatchType, RotationManager,
    Team,
};
use uuid::Uuid;

#[test]
fn full_rotation_night() {
    let manager = RotationManager::new();
    let courts = [Uuid::new_v4(), Uuid::new_v4()];
    let rotation = manager.create_rotation(&courts, true).unwrap();
    let rotation_id = rotation.rotation_id;

    // Four players arrive.
    let ann = Uuid::new_v4();
    let ben = Uuid::new_v4();
    let cam = Uuid::new_v4();
    let dee = Uuid::new_v4();
    for (player_id, name) in [(ann, "Ann"), (ben, "Ben"), (cam, "Cam"), (dee, "Dee")] {
        manager.check_in(rotation_id, player_id, Some(name.to_string())).unwrap();
    }

    // Two pairs queue up for doubles.
    manager.enqueue(rotation_id, MatchType::Doubles, &[ann, ben]).unwrap();
    manager.enqueue(rotation_id, MatchType::Doubles, &[cam, dee]).unwrap();

    // The suggester pairs them in queue order (nobody has played yet).
    let suggestion = manager.suggest(rotation_id, MatchType::Doubles).unwrap().unwrap();
    assert_eq!(suggestion.teams[0], vec![ann, ben]);
    assert_eq!(suggestion.teams[1], vec![cam, dee]);

    // Start on the first court; the second stays free.
    let occupancy_id = rotation.court_occupancy_ids[0];
    let match_id = manager
        .start_match(
            rotation_id,
            occupancy_id,
            suggestion.match_type,
            suggestion.teams.clone(),
            Some(&suggestion.entry_ids),
        )
        .unwrap();

    let state = manager.rotation_state(rotation_id).unwrap();
    assert!(state.queue.is_empty());
    let busy = state.courts.iter().find(|c| c.occupancy.id == occupancy_id).unwrap();
    assert_eq!(busy.occupancy.status, CourtStatus::InMatch);
    assert_eq!(busy.current_match.as_ref().unwrap().id, match_id);
    let free = state.courts.iter().find(|c| c.occupancy.id != occupancy_id).unwrap();
    assert_eq!(free.occupancy.status, CourtStatus::Available);

    // No court for a second match on the same occupancy.
    let conflict = manager.start_match(
        rotation_id,
        occupancy_id,
        MatchType::Singles,
        [vec![Uuid::new_v4()], vec![Uuid::new_v4()]],
        None,
    );
    assert!(matches!(
        conflict,
        Err(ManagerError::Core(CoreError::CourtNotAvailable { .. }))
    ));

    // Team 1 takes it.
    manager
        .end_match(rotation_id, match_id, Some(serde_json::json!([21, 14])), Some(Team::One))
        .unwrap();

    let rankings = manager.rankings(rotation_id).unwrap();
    assert_eq!(rankings.len(), 4);
    assert_eq!(rankings[0].wins, 1);
    assert_eq!(rankings[0].rank, 1);
    // Winners ahead of losers; within each pair names break the tie.
    assert_eq!(rankings[0].display_name.as_deref(), Some("Ann"));
    assert_eq!(rankings[1].display_name.as_deref(), Some("Ben"));
    assert_eq!(rankings[2].display_name.as_deref(), Some("Cam"));
    assert_eq!(rankings[3].display_name.as_deref(), Some("Dee"));

    // Scorekeeper had it backwards: team 2 actually won.
    manager
        .correct_result(rotation_id, match_id, None, Some(Some(Team::Two)))
        .unwrap();
    let rankings = manager.rankings(rotation_id).unwrap();
    assert_eq!(rankings[0].display_name.as_deref(), Some("Cam"));
    assert_eq!(rankings[2].display_name.as_deref(), Some("Ann"));

    // Everyone is back to checked-in, so the same four can requeue.
    manager.enqueue(rotation_id, MatchType::Doubles, &[ann, cam]).unwrap();
    manager.enqueue(rotation_id, MatchType::Doubles, &[ben, dee]).unwrap();
    let rematch = manager.suggest(rotation_id, MatchType::Doubles).unwrap().unwrap();
    let rematch_id = manager
        .start_match(
            rotation_id,
            occupancy_id,
            rematch.match_type,
            rematch.teams.clone(),
            Some(&rematch.entry_ids),
        )
        .unwrap();

    // Rain stops play; with return_to_queue both teams re-enter the queue.
    manager.cancel_match(rotation_id, rematch_id).unwrap();
    let queue = manager.queue_contents(rotation_id).unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].player_ids, rematch.teams[0]);
    assert_eq!(queue[1].player_ids, rematch.teams[1]);

    let history = manager.match_history(rotation_id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|m| m.status == MatchStatus::Cancelled));
    assert!(history.iter().any(|m| m.status == MatchStatus::Ended));

    // Dee heads home; her queue entry comes out, her stats stay.
    let dee_entry = queue.iter().find(|e| e.player_ids.contains(&dee)).unwrap();
    manager.remove_entry(rotation_id, dee_entry.id).unwrap();
    manager.check_out(rotation_id, dee, CheckoutStatus::Done).unwrap();
    let state = manager.rotation_state(rotation_id).unwrap();
    assert_eq!(state.queue.len(), 1);
    let dee_row = state.players.iter().find(|p| p.player_id == dee).unwrap();
    assert_eq!(dee_row.games_played, 1);
}

#[test]
fn fairness_prefers_fresh_players_over_recent_winners() {
    let manager = RotationManager::new();
    let rotation = manager.create_rotation(&[Uuid::new_v4()], true).unwrap();
    let rotation_id = rotation.rotation_id;
    let occupancy_id = rotation.court_occupancy_ids[0];

    let veterans = [Uuid::new_v4(), Uuid::new_v4()];
    let newcomers = [Uuid::new_v4(), Uuid::new_v4()];
    for player_id in veterans.iter().chain(newcomers.iter()) {
        manager.check_in(rotation_id, *player_id, None).unwrap();
    }

    // Veterans play a quick singles pair of games first.
    let match_id = manager
        .start_match(
            rotation_id,
            occupancy_id,
            MatchType::Singles,
            [vec![veterans[0]], vec![veterans[1]]],
            None,
        )
        .unwrap();
    manager.end_match(rotation_id, match_id, None, Some(Team::One)).unwrap();

    // Veterans queue again before the newcomers do.
    manager.enqueue(rotation_id, MatchType::Doubles, &veterans).unwrap();
    manager.enqueue(rotation_id, MatchType::Doubles, &newcomers).unwrap();

    // The never-played pair still jumps ahead.
    let suggestion = manager.suggest(rotation_id, MatchType::Doubles).unwrap().unwrap();
    assert_eq!(suggestion.teams[0], newcomers.to_vec());
    assert_eq!(suggestion.teams[1], veterans.to_vec());
}

#[test]
fn manual_reorder_pins_the_queue() {
    let manager = RotationManager::new();
    let rotation = manager.create_rotation(&[Uuid::new_v4()], true).unwrap();
    let rotation_id = rotation.rotation_id;

    let pairs: Vec<[Uuid; 2]> = (0..3).map(|_| [Uuid::new_v4(), Uuid::new_v4()]).collect();
    for pair in &pairs {
        for player_id in pair {
            manager.check_in(rotation_id, *player_id, None).unwrap();
        }
    }
    let entries: Vec<Uuid> = pairs
        .iter()
        .map(|pair| manager.enqueue(rotation_id, MatchType::Doubles, pair).unwrap().id)
        .collect();

    // Operator drags the last pair to the front.
    manager
        .reorder_queue(rotation_id, &[entries[2], entries[0], entries[1]])
        .unwrap();

    let suggestion = manager.suggest(rotation_id, MatchType::Doubles).unwrap().unwrap();
    assert_eq!(suggestion.entry_ids, [entries[2], entries[0]]);
}
