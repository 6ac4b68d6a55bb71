#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use crate::arm::ArmSettings;
    use crate::controller::ArmController;
    use crate::parameter_error::ParameterError;
    use crate::parameters::opw_kinematics::Parameters;

    const READ_ERROR: &'static str = "Failed to load parameters from file";

    const GEOMETRY: &str = "opw_kinematics_geometric_parameters:
  a1: 0.15
  a2: -0.10
  b: 0.0
  c1: 0.525
  c2: 0.77
  c3: 0.74
";

    #[test]
    fn test_parameters_from_yaml() {
        let filename = "src/tests/data/fanuc/fanuc_m16ib20.yaml";
        let loaded = Parameters::from_yaml_file(filename).expect(READ_ERROR);

        let expected = Parameters {
            a1: 0.15,
            a2: -0.10,
            b: 0.0,
            c1: 0.525,
            c2: 0.77,
            c3: 0.74,
            c4: 0.10,
            offsets: [0.0, 0.0, -90.0_f64.to_radians(), 0.0, 0.0, 180.0_f64.to_radians()],
            sign_corrections: [1, 1, -1, -1, -1, -1],
        };

        assert_eq!(expected.a1, loaded.a1);
        assert_eq!(expected.a2, loaded.a2);
        assert_eq!(expected.b, loaded.b);
        assert_eq!(expected.c1, loaded.c1);
        assert_eq!(expected.c2, loaded.c2);
        assert_eq!(expected.c3, loaded.c3);
        assert_eq!(expected.c4, loaded.c4);
        assert_eq!(expected.offsets, loaded.offsets);
        assert_eq!(expected.sign_corrections, loaded.sign_corrections);
    }

    #[test]
    fn test_offsets_and_signs_are_optional() {
        let loaded = Parameters::from_yaml_str(&format!("{}  c4: 0.10\n", GEOMETRY)).expect(READ_ERROR);
        assert_eq!(loaded.offsets, [0.0; 6]);
        assert_eq!(loaded.sign_corrections, [1; 6]);
    }

    #[test]
    fn test_missing_field() {
        let err = Parameters::from_yaml_str(GEOMETRY).unwrap_err();
        assert!(matches!(err, ParameterError::MissingField(ref field) if field == "c4"), "{}", err);

        let err = Parameters::from_yaml_str("motor_speed: 1.0\n").unwrap_err();
        assert!(matches!(err, ParameterError::MissingField(_)), "{}", err);
    }

    #[test]
    fn test_wrong_angle() {
        let yaml = format!("{}  c4: 0.10\nopw_kinematics_joint_offsets: [0, 0, deg(abc), 0, 0, 0]\n", GEOMETRY);
        let err = Parameters::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ParameterError::WrongAngle(ref text) if text == "deg(abc)"), "{}", err);
    }

    #[test]
    fn test_bad_sign_correction() {
        let yaml = format!("{}  c4: 0.10\nopw_kinematics_joint_sign_corrections: [1, 1, 2, 1, 1, 1]\n", GEOMETRY);
        let err = Parameters::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("sign_corrections[2] must be -1 or 1"), "{}", err);
    }

    #[test]
    fn test_wrong_length() {
        let yaml = format!("{}  c4: 0.10\nopw_kinematics_joint_offsets: [0, 0, 0, 0, 0]\n", GEOMETRY);
        let err = Parameters::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ParameterError::InvalidLength { expected: 6, found: 5 }), "{}", err);
    }

    #[test]
    fn test_missing_file() {
        let err = Parameters::from_yaml_file("src/tests/data/no_such_file.yaml").unwrap_err();
        assert!(matches!(err, ParameterError::IoError(_)));
    }

    #[test]
    fn test_yaml_round_trip() {
        let original = Parameters::irb2400_10();
        let loaded = Parameters::from_yaml_str(&original.to_yaml()).expect(READ_ERROR);
        assert_eq!(original.c2, loaded.c2);
        assert_eq!(original.sign_corrections, loaded.sign_corrections);
        for (a, b) in original.offsets.iter().zip(loaded.offsets.iter()) {
            assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_arm_settings_from_yaml() {
        let settings = ArmSettings::from_yaml_file("src/tests/data/arm.yaml").expect(READ_ERROR);
        assert_eq!(settings.parameters.c1, 0.45);
        assert_eq!(settings.tick_rate, 30.0);
        assert_eq!(settings.motor_speed, 2.0);
        assert!((settings.jog_linear_step() - 2.0 / 30.0).abs() < 1e-12);

        // Speeds are given per second and kept per tick
        assert!((settings.joint_speeds[0] - 5.0_f64.to_radians()).abs() < 1e-12);
        assert!((settings.joint_speeds[5] - 14.0_f64.to_radians()).abs() < 1e-12);

        assert!((settings.constraints.from[1] - 248.7_f64.to_radians()).abs() < 1e-12);
        assert!((settings.constraints.to[4] - 99.0_f64.to_radians()).abs() < 1e-12);

        // Not in the file
        let defaults = ArmSettings::default();
        assert_eq!(settings.orientation_speed, defaults.orientation_speed);
        assert_eq!(settings.jog_rotation_step, defaults.jog_rotation_step);
    }

    #[test]
    fn test_base_from_yaml() {
        let settings = ArmSettings::from_yaml_file("src/tests/data/arm.yaml").expect(READ_ERROR);
        assert!((settings.base.rotation.angle() - PI / 2.0).abs() < 1e-12);

        // The flange at zero is 1.79 m above the pedestal and 5 cm in front of the axis,
        // which is turned towards +Y
        let arm = ArmController::new(settings);
        let flange = arm.flange_pose().translation.vector;
        assert!(flange.x.abs() < 1e-9, "{:?}", flange);
        assert!((flange.y - 0.05).abs() < 1e-9, "{:?}", flange);
        assert!((flange.z - 2.29).abs() < 1e-9, "{:?}", flange);
    }

    #[test]
    fn test_non_positive_tick_rate() {
        let yaml = format!("{}  c4: 0.10\ntick_rate: 0\n", GEOMETRY);
        let err = ArmSettings::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ParameterError::ParseError(_)), "{}", err);
    }

    #[test]
    fn test_settings_default_when_absent() {
        let settings = ArmSettings::from_yaml_str(&format!("{}  c4: 0.10\n", GEOMETRY)).expect(READ_ERROR);
        let defaults = ArmSettings::default();
        assert_eq!(settings.constraints.from, defaults.constraints.from);
        assert_eq!(settings.joint_speeds, defaults.joint_speeds);
        assert_eq!(settings.base, defaults.base);
        assert_eq!(settings.parameters.c1, 0.525);
    }
}
