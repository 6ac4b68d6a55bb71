//! Supports reading the arm settings from YAML file (optional)

use std::path::Path;

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use regex::Regex;
use yaml_rust2::{Yaml, YamlLoader};

use crate::arm::ArmSettings;
use crate::constraints::Constraints;
use crate::parameter_error::ParameterError;
use crate::parameters::opw_kinematics::Parameters;

impl Parameters {
    /// Read the robot geometry from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # FANUC m16ib20
    /// opw_kinematics_geometric_parameters:
    ///   a1: 0.15
    ///   a2: -0.10
    ///   b: 0.0
    ///   c1: 0.525
    ///   c2: 0.77
    ///   c3: 0.74
    ///   c4: 0.10
    /// opw_kinematics_joint_offsets: [0.0, 0.0, deg(-90.0), 0.0, 0.0, deg(180.0)]
    /// opw_kinematics_joint_sign_corrections: [1, 1, -1, -1, -1, -1]
    /// ```
    /// Offsets and sign corrections are optional. Angles can be written in degrees as deg(angle).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load(contents)?;
        YamlReader::new()?.parameters(&doc)
    }
}

impl ArmSettings {
    /// Read the arm settings from YAML file. Besides the OPW parameters (see
    /// [Parameters::from_yaml_file]) the file may contain the following, all optional:
    /// ```yaml
    /// joint_limits:
    ///   from: [0, deg(248.7), deg(288.0), 0, deg(265.5), 0]
    ///   to: [0, deg(115.2), deg(250.0), 0, deg(99.0), 0]
    /// joint_speeds: [deg(150), deg(150), deg(200), deg(250), deg(250), deg(420)] # per second
    /// base_translation: [0.0, 0.0, 0.5]
    /// base_rotation: [0.0, 0.0, deg(90)] # roll, pitch, yaw
    /// motor_speed: 1.0 # m/s
    /// orientation_speed: deg(180) # per second
    /// jog_rotation_step: deg(2.5) # per tick
    /// tick_rate: 60
    /// ```
    /// Values that are not given are taken from [ArmSettings::default].
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load(contents)?;
        let reader = YamlReader::new()?;
        let defaults = ArmSettings::default();

        let parameters = reader.parameters(&doc)?;
        let tick_rate = reader.optional_number(&doc["tick_rate"], "tick_rate")?
            .unwrap_or(defaults.tick_rate);
        if tick_rate <= 0.0 {
            return Err(ParameterError::ParseError(format!("tick_rate must be positive (got {})", tick_rate)));
        }

        let limits = &doc["joint_limits"];
        let constraints = if limits.is_badvalue() {
            defaults.constraints
        } else {
            Constraints::new(
                reader.six(&limits["from"], "joint_limits.from")?,
                reader.six(&limits["to"], "joint_limits.to")?,
            )
        };

        let joint_speeds = match reader.optional_six(&doc["joint_speeds"], "joint_speeds")? {
            Some(per_second) => per_second.map(|speed| speed / tick_rate),
            None => defaults.joint_speeds,
        };

        let translation = match reader.optional_vector(&doc["base_translation"], "base_translation")? {
            Some([x, y, z]) => Translation3::new(x, y, z),
            None => defaults.base.translation,
        };
        let rotation = match reader.optional_vector(&doc["base_rotation"], "base_rotation")? {
            Some([roll, pitch, yaw]) => UnitQuaternion::from_euler_angles(roll, pitch, yaw),
            None => defaults.base.rotation,
        };

        Ok(ArmSettings {
            parameters,
            constraints,
            joint_speeds,
            base: Isometry3::from_parts(translation, rotation),
            motor_speed: reader.optional_number(&doc["motor_speed"], "motor_speed")?
                .unwrap_or(defaults.motor_speed),
            tick_rate,
            orientation_speed: reader.optional_number(&doc["orientation_speed"], "orientation_speed")?
                .unwrap_or(defaults.orientation_speed),
            jog_rotation_step: reader.optional_number(&doc["jog_rotation_step"], "jog_rotation_step")?
                .unwrap_or(defaults.jog_rotation_step),
            axes: defaults.axes,
        })
    }
}

fn load(contents: &str) -> Result<Yaml, ParameterError> {
    let mut docs = YamlLoader::load_from_str(contents)
        .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
    if docs.is_empty() {
        return Err(ParameterError::ParseError("empty document".to_string()));
    }
    Ok(docs.swap_remove(0))
}

/// Reads numbers that may be written as deg(angle).
struct YamlReader {
    deg: Regex,
}

impl YamlReader {
    fn new() -> Result<Self, ParameterError> {
        let deg = Regex::new(r"^deg\(\s*([-+]?\d+(?:\.\d*)?(?:[eE][-+]?\d+)?)\s*\)$")
            .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
        Ok(YamlReader { deg })
    }

    fn parameters(&self, doc: &Yaml) -> Result<Parameters, ParameterError> {
        let gp = &doc["opw_kinematics_geometric_parameters"];
        if gp.is_badvalue() {
            return Err(ParameterError::MissingField("opw_kinematics_geometric_parameters".to_string()));
        }
        let field = |name: &str| -> Result<f64, ParameterError> {
            let value = self.optional_number(&gp[name], name)?
                .ok_or_else(|| ParameterError::MissingField(name.to_string()))?;
            if !value.is_finite() {
                return Err(ParameterError::ParseError(format!(
                    "geometric parameter '{}' must be finite (got {})", name, value)));
            }
            Ok(value)
        };

        let offsets = self.optional_six(&doc["opw_kinematics_joint_offsets"], "opw_kinematics_joint_offsets")?
            .unwrap_or([0.0; 6]);
        let sign_corrections = match self.optional_six(
            &doc["opw_kinematics_joint_sign_corrections"], "opw_kinematics_joint_sign_corrections")? {
            Some(values) => {
                let mut signs = [1_i8; 6];
                for (i, &value) in values.iter().enumerate() {
                    signs[i] = if value == 1.0 {
                        1
                    } else if value == -1.0 {
                        -1
                    } else {
                        return Err(ParameterError::ParseError(format!(
                            "sign_corrections[{}] must be -1 or 1 (got {})", i, value)));
                    };
                }
                signs
            }
            None => [1; 6],
        };

        Ok(Parameters {
            a1: field("a1")?,
            a2: field("a2")?,
            b: field("b")?,
            c1: field("c1")?,
            c2: field("c2")?,
            c3: field("c3")?,
            c4: field("c4")?,
            offsets,
            sign_corrections,
        })
    }

    fn optional_number(&self, value: &Yaml, name: &str) -> Result<Option<f64>, ParameterError> {
        match value {
            Yaml::BadValue | Yaml::Null => Ok(None),
            Yaml::Integer(i) => Ok(Some(*i as f64)),
            Yaml::Real(text) => text.parse::<f64>()
                .map(Some)
                .map_err(|_| ParameterError::ParseError(format!("{}: '{}' is not a number", name, text))),
            Yaml::String(text) => self.angle(text.trim()).map(Some),
            _ => Err(ParameterError::ParseError(format!("{}: number expected", name))),
        }
    }

    /// Parses deg(angle) into radians.
    fn angle(&self, text: &str) -> Result<f64, ParameterError> {
        let captures = self.deg.captures(text)
            .ok_or_else(|| ParameterError::WrongAngle(text.to_string()))?;
        captures[1].parse::<f64>()
            .map(f64::to_radians)
            .map_err(|_| ParameterError::WrongAngle(text.to_string()))
    }

    fn optional_list<const N: usize>(&self, value: &Yaml, name: &str) -> Result<Option<[f64; N]>, ParameterError> {
        let items = match value {
            Yaml::BadValue | Yaml::Null => return Ok(None),
            Yaml::Array(items) => items,
            _ => return Err(ParameterError::ParseError(format!("{}: list expected", name))),
        };
        if items.len() != N {
            return Err(ParameterError::InvalidLength { expected: N, found: items.len() });
        }
        let mut result = [0.0; N];
        for (slot, item) in result.iter_mut().zip(items.iter()) {
            *slot = self.optional_number(item, name)?
                .ok_or_else(|| ParameterError::ParseError(format!("{}: empty value", name)))?;
        }
        Ok(Some(result))
    }

    fn optional_six(&self, value: &Yaml, name: &str) -> Result<Option<[f64; 6]>, ParameterError> {
        self.optional_list::<6>(value, name)
    }

    fn optional_vector(&self, value: &Yaml, name: &str) -> Result<Option<[f64; 3]>, ParameterError> {
        self.optional_list::<3>(value, name)
    }

    fn six(&self, value: &Yaml, name: &str) -> Result<[f64; 6], ParameterError> {
        self.optional_six(value, name)?
            .ok_or_else(|| ParameterError::MissingField(name.to_string()))
    }
}
