//! Hardcoded OPW parameters for the simulated arm and a few industrial robots

pub mod opw_kinematics {
    use crate::parameters::opw_kinematics::Parameters;
    use std::f64::consts::PI;

    impl Parameters {
        /// All zero geometry, no offsets, no sign reversal.
        pub fn new() -> Self {
            Parameters {
                a1: 0.0,
                a2: 0.0,
                b: 0.0,
                c1: 0.0,
                c2: 0.0,
                c3: 0.0,
                c4: 0.0,
                offsets: [0.0; 6],
                sign_corrections: [1; 6],
            }
        }

        /// Arm used by the simulator by default. At zero joint angles it stands upright,
        /// with the flange at (0.05, 0, 1.79) pointing up.
        pub fn simulated_arm() -> Self {
            Parameters {
                a1: 0.150,
                a2: -0.100,
                b: 0.000,
                c1: 0.450,
                c2: 0.600,
                c3: 0.640,
                c4: 0.100,
                ..Self::new()
            }
        }

        pub fn irb2400_10() -> Self {
            Parameters {
                a1: 0.100,
                a2: -0.135,
                b: 0.000,
                c1: 0.615,
                c2: 0.705,
                c3: 0.755,
                c4: 0.085,
                offsets: [0.0, 0.0, -PI / 2.0, 0.0, 0.0, 0.0],
                ..Self::new()
            }
        }

        pub fn kuka_kr6_r700_sixx() -> Self {
            Parameters {
                a1: 0.025,
                a2: -0.035,
                b: 0.000,
                c1: 0.400,
                c2: 0.315,
                c3: 0.365,
                c4: 0.080,
                offsets: [0.0, -PI / 2.0, 0.0, 0.0, 0.0, 0.0],
                sign_corrections: [-1, 1, 1, -1, 1, -1],
            }
        }

        pub fn staubli_tx40() -> Self {
            Parameters {
                a1: 0.000,
                a2: 0.000,
                b: 0.035,
                c1: 0.320,
                c2: 0.225,
                c3: 0.225,
                c4: 0.065,
                offsets: [0.0, 0.0, -PI / 2.0, 0.0, 0.0, 0.0],
                ..Self::new()
            }
        }
    }
}
