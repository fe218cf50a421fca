mod robustness_unit;
