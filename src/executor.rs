//! Motion instructions of a teach pendant program, how their targets are resolved and how
//! a program is stepped through.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::arm::{MotionRequest, MotionState, MotionTarget, Speed, Termination};
use crate::capabilities::{FrameProvider, RegisterProvider};
use crate::controller::ArmController;
use crate::motion_error::ExecutionError;
use crate::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionType {
    Joint,
    Linear,
    /// Arc through the point of the instruction, ending at the point of its secondary instruction.
    Circular,
}

/// Where the target of an instruction is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRef {
    /// Position local to the program, P[i].
    Local(usize),
    /// Global position register, PR[i].
    Global(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionInstruction {
    pub motion: MotionType,
    pub point: PointRef,
    /// Position register added to the target.
    pub offset: Option<usize>,
    pub tool_frame: Option<usize>,
    pub user_frame: Option<usize>,
    pub speed: Speed,
    pub termination: Termination,
    /// End point of a circular motion.
    pub secondary: Option<Box<MotionInstruction>>,
}

impl MotionInstruction {
    /// Joint motion at the given fraction of the maximal joint speed.
    pub fn joint(point: PointRef, fraction: f64) -> Self {
        Self::new(MotionType::Joint, point, Speed::Fraction(fraction))
    }

    /// Linear motion at the given flange speed in m/s.
    pub fn linear(point: PointRef, meters_per_second: f64) -> Self {
        Self::new(MotionType::Linear, point, Speed::MetersPerSecond(meters_per_second))
    }

    /// Circular motion through `via` ending at `end`, at the given flange speed in m/s.
    pub fn circular(via: PointRef, end: PointRef, meters_per_second: f64) -> Self {
        let speed = Speed::MetersPerSecond(meters_per_second);
        MotionInstruction {
            secondary: Some(Box::new(Self::new(MotionType::Circular, end, speed))),
            ..Self::new(MotionType::Circular, via, speed)
        }
    }

    fn new(motion: MotionType, point: PointRef, speed: Speed) -> Self {
        MotionInstruction {
            motion,
            point,
            offset: None,
            tool_frame: None,
            user_frame: None,
            speed,
            termination: Termination::Fine,
            secondary: None,
        }
    }

    pub fn with_offset(self, register: usize) -> Self {
        MotionInstruction { offset: Some(register), ..self }
    }

    pub fn with_frames(self, tool_frame: Option<usize>, user_frame: Option<usize>) -> Self {
        let secondary = self.secondary
            .map(|secondary| Box::new(MotionInstruction { tool_frame, user_frame, ..*secondary }));
        MotionInstruction { tool_frame, user_frame, secondary, ..self }
    }

    pub fn with_termination(self, termination: Termination) -> Self {
        MotionInstruction { termination, ..self }
    }
}

fn write_point(f: &mut fmt::Formatter, point: &PointRef, offset: &Option<usize>) -> fmt::Result {
    match point {
        PointRef::Local(index) => write!(f, "P[{}]", index + 1)?,
        PointRef::Global(index) => write!(f, "PR[{}]", index + 1)?,
    }
    if let Some(offset) = offset {
        write!(f, " OFST PR[{}]", offset + 1)?;
    }
    Ok(())
}

impl fmt::Display for MotionInstruction {
    /// Pendant notation, for example `L PR[3] 250mm/s CONT50 OFST PR[2]`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let motion = match self.motion {
            MotionType::Joint => "J",
            MotionType::Linear => "L",
            MotionType::Circular => "C",
        };
        write!(f, "{} ", motion)?;
        write_point(f, &self.point, &None)?;
        match self.speed {
            Speed::Fraction(fraction) => write!(f, " {}%", (fraction * 100.0).round() as i64)?,
            Speed::MetersPerSecond(rate) => write!(f, " {}mm/s", (rate * 1000.0).round() as i64)?,
        }
        match self.termination {
            Termination::Fine => write!(f, " FINE")?,
            Termination::Continuous(tolerance) => write!(f, " CONT{}", tolerance)?,
        }
        if let Some(offset) = self.offset {
            write!(f, " OFST PR[{}]", offset + 1)?;
        }
        if let Some(secondary) = &self.secondary {
            write!(f, " : ")?;
            write_point(f, &secondary.point, &secondary.offset)?;
        }
        Ok(())
    }
}

/// Instructions and local positions of a program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub name: String,
    pub positions: HashMap<usize, Point>,
    pub instructions: Vec<MotionInstruction>,
}

impl Program {
    pub fn new(name: &str) -> Self {
        Program { name: name.to_string(), ..Default::default() }
    }
}

/// Turns motion instructions into moves of the arm.
pub struct MotionInstructionExecutor<'a> {
    registers: &'a dyn RegisterProvider,
    frames: &'a dyn FrameProvider,
}

impl<'a> MotionInstructionExecutor<'a> {
    pub fn new(registers: &'a dyn RegisterProvider, frames: &'a dyn FrameProvider) -> Self {
        MotionInstructionExecutor { registers, frames }
    }

    /// Flange target of the instruction in native coordinates. The stored point is taken out of
    /// its user frame, shifted by the offset register and finally moved from the tool centre point
    /// to the flange. Joint angles, if stored, are carried along.
    ///
    /// The tool frame comes after the offset, unlike the user frame, so a rotating offset turns
    /// the tool around its centre point and leaves that point where it was taught.
    pub fn resolve(&self, instruction: &MotionInstruction, program: &Program) -> Result<Point, ExecutionError> {
        let mut point = match instruction.point {
            PointRef::Local(index) => *program.positions.get(&index).ok_or(ExecutionError::MissingPoint(index))?,
            PointRef::Global(index) => self.registers.position(index)?,
        };

        if let Some(index) = instruction.user_frame {
            let frame = self.frames.user_frame(index).ok_or(ExecutionError::MissingUserFrame(index))?;
            point = frame.to_native(&point);
        }

        if let Some(index) = instruction.offset {
            point = point.offset_by(&self.registers.position(index)?);
        }

        if let Some(index) = instruction.tool_frame {
            let tool = self.frames.tool_frame(index).ok_or(ExecutionError::MissingToolFrame(index))?;
            let flange = tool.flange_for_tcp(&point.pose());
            point = Point { joints: point.joints, ..Point::from_pose(&flange) };
        }

        Ok(point)
    }

    /// Starts the move of the instruction. The arm does the actual motion on its ticks.
    pub fn execute(&self, arm: &mut ArmController, instruction: &MotionInstruction,
                   program: &Program) -> Result<(), ExecutionError> {
        if arm.is_faulted() {
            return Err(ExecutionError::Faulted);
        }
        let point = self.resolve(instruction, program)?;
        let target = match instruction.motion {
            MotionType::Joint => {
                let joints = match point.joints {
                    Some(joints) => joints,
                    None => arm.resolve_joints(&point.pose())?,
                };
                MotionTarget::Joints(joints)
            }
            MotionType::Linear => MotionTarget::Pose(point.pose()),
            MotionType::Circular => {
                let secondary = instruction.secondary.as_ref().ok_or(ExecutionError::MissingSecondary)?;
                let end = self.resolve(secondary, program)?;
                MotionTarget::Arc { via: point.pose(), end: end.pose() }
            }
        };
        debug!("Executing {}", instruction);
        arm.request(&MotionRequest { target, speed: instruction.speed, termination: instruction.termination })?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerState {
    /// A move is in progress or the next one was just issued.
    Running,
    /// Single step mode, waiting for `resume`.
    Paused,
    Finished,
    Stopped(ExecutionError),
}

/// Walks through the instructions of a program, issuing the next one whenever the arm halts.
#[derive(Debug, Clone)]
pub struct ProgramRunner {
    next: usize,
    single_step: bool,
    paused: bool,
    state: RunnerState,
}

impl ProgramRunner {
    pub fn new(single_step: bool) -> Self {
        ProgramRunner { next: 0, single_step, paused: false, state: RunnerState::Running }
    }

    /// Index of the instruction that will be issued next.
    pub fn next_instruction(&self) -> usize {
        self.next
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn set_single_step(&mut self, single_step: bool) {
        self.single_step = single_step;
    }

    /// Continues after a single step pause.
    pub fn resume(&mut self) {
        self.paused = false;
        if self.state == RunnerState::Paused {
            self.state = RunnerState::Running;
        }
    }

    /// Call once per tick, before the arm ticks.
    pub fn update(&mut self, arm: &mut ArmController, executor: &MotionInstructionExecutor,
                  program: &Program) -> &RunnerState {
        if matches!(self.state, RunnerState::Finished | RunnerState::Stopped(_)) {
            return &self.state;
        }
        if arm.is_faulted() {
            warn!("Program {} stopped at instruction {} by a fault", program.name, self.next);
            self.state = RunnerState::Stopped(ExecutionError::Faulted);
            return &self.state;
        }
        if arm.motion_state() != MotionState::Halted {
            return &self.state;
        }
        if self.paused {
            self.state = RunnerState::Paused;
            return &self.state;
        }
        let Some(instruction) = program.instructions.get(self.next) else {
            info!("Program {} finished", program.name);
            self.state = RunnerState::Finished;
            return &self.state;
        };
        match executor.execute(arm, instruction, program) {
            Ok(()) => {
                self.next += 1;
                self.paused = self.single_step;
                self.state = RunnerState::Running;
            }
            Err(err) => {
                warn!("Program {} stopped at {}: {}", program.name, instruction, err);
                self.state = RunnerState::Stopped(err);
            }
        }
        &self.state
    }
}
