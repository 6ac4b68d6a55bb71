//! Defines the OPW parameter data structure

pub mod opw_kinematics {
    use crate::utils::deg;

    /// Geometry of the arm. See [parameters_robots.rs](parameters_robots.rs) for concrete arm models.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Parameters {
        /// Horizontal offset from the J1 axis to the J2 axis.
        pub a1: f64,

        /// Offset between the elbow (J3) and the forearm axis (J4), perpendicular to the forearm.
        pub a2: f64,

        /// Lateral offset between J1 and J2. Zero for most arms.
        pub b: f64,

        /// Height of the J2 axis above the base.
        pub c1: f64,

        /// Length of the lower arm, J2 to J3.
        pub c2: f64,

        /// Length of the forearm, J3 to the wrist centre.
        pub c3: f64,

        /// Distance from the wrist centre to the flange.
        pub c4: f64,

        /// Offsets applied to each joint angle to adjust the reference zero position.
        pub offsets: [f64; 6],

        /// Direction of positive rotation per joint. `-1` reverses the default direction.
        pub sign_corrections: [i8; 6],
    }

    impl Parameters {
        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            format!(
                "opw_kinematics_geometric_parameters:\n  \
              a1: {}\n  \
              a2: {}\n  \
              b: {}\n  \
              c1: {}\n  \
              c2: {}\n  \
              c3: {}\n  \
              c4: {}\n\
            opw_kinematics_joint_offsets: [{}]\n\
            opw_kinematics_joint_sign_corrections: [{}]\n",
                self.a1,
                self.a2,
                self.b,
                self.c1,
                self.c2,
                self.c3,
                self.c4,
                self.offsets.iter().map(|x| deg(x))
                    .collect::<Vec<_>>().join(","),
                self.sign_corrections.iter().map(|x| x.to_string())
                    .collect::<Vec<_>>().join(",")
            )
        }
    }
}
