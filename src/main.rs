use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use tracing::info;

use rs_arm_simulator::arm::{ArmSettings, JogFrame};
use rs_arm_simulator::capabilities::{Frames, Registers};
use rs_arm_simulator::controller::ArmController;
use rs_arm_simulator::end_effector::EndEffectorKind;
use rs_arm_simulator::executor::{MotionInstruction, MotionInstructionExecutor, PointRef, Program, ProgramRunner, RunnerState};
use rs_arm_simulator::frame::Frame;
use rs_arm_simulator::kinematic_traits::{Kinematics, Pose};
use rs_arm_simulator::point::Point;
use rs_arm_simulator::scene::{Part, Scene};
use rs_arm_simulator::utils::{dump_joints, dump_pose, format_joints};

/// Runs the arm simulator without graphics, printing where the arm goes.
#[derive(Parser, Debug)]
#[command(name = "rs-arm-simulator")]
#[command(about = "Tick driven simulator of a six axis robot arm")]
struct Args {
    /// YAML file with the arm settings. The built-in simulated arm is used if not given.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Upper bound on the number of simulated ticks.
    #[arg(long, default_value = "10000")]
    max_ticks: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Runs a short pick and place program.
    Program {
        /// Stop after every instruction and print the arm.
        #[arg(long)]
        single_step: bool,
    },
    /// Jogs the arm for the given number of ticks.
    Jog {
        #[arg(long, value_enum, default_value = "world")]
        frame: JogMode,

        /// Jog rates along X, Y and Z (or of J1, J2, J3 in the joint frame), -1.0 to 1.0.
        #[arg(long, num_args = 3, allow_negative_numbers = true, default_values = ["1.0", "0.0", "0.0"])]
        rates: Vec<f64>,

        #[arg(long, default_value = "60")]
        ticks: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum JogMode {
    Joint,
    World,
    Tool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse()?),
        )
        .init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => ArmSettings::from_yaml_file(path)
            .with_context(|| format!("Failed to read arm settings from {}", path.display()))?,
        None => ArmSettings::default(),
    };
    info!("Arm parameters:\n{}", settings.parameters.to_yaml());

    let mut arm = ArmController::new(settings);
    match args.command {
        Command::Program { single_step } => run_program(&mut arm, single_step, args.max_ticks),
        Command::Jog { frame, rates, ticks } => jog(&mut arm, frame, &rates, ticks.min(args.max_ticks)),
    }
}

/// Moves to a part in front of the arm, grabs it with the claw and carries it along an arc.
fn run_program(arm: &mut ArmController, single_step: bool, max_ticks: usize) -> Result<()> {
    let mut registers = Registers::with_io(5);
    let frames = Frames {
        tool: [(0, Frame::new(Vector3::new(0.0, 0.0, 0.085), UnitQuaternion::identity()))].into(),
        ..Default::default()
    };
    while arm.config().end_effector.kind() != EndEffectorKind::Claw {
        arm.cycle_end_effector(&mut registers);
    }

    let approach = [0.0, 0.3, 0.6, 0.0, 0.5, 0.0];
    let above = arm.kinematics().forward(&approach);
    let grasp = tcp_of(&(Translation3::new(0.0, 0.0, -0.05) * above));
    let part = Part::new(1, "cube", [0.01; 3], grasp);
    let scene = Scene::new(vec![part]);

    let mut program = Program::new("pick");
    program.positions.insert(0, Point::from_joints(approach));
    program.positions.insert(1, Point::from_pose(&grasp));
    program.positions.insert(2, Point::from_pose(&(Translation3::new(-0.05, 0.05, 0.05) * grasp)));
    program.positions.insert(3, Point::from_pose(&(Translation3::new(-0.1, 0.0, 0.05) * grasp)));
    program.instructions = vec![
        MotionInstruction::joint(PointRef::Local(0), 0.8),
        MotionInstruction::linear(PointRef::Local(1), 0.25).with_frames(Some(0), None),
    ];
    let carry = Program {
        name: "carry".to_string(),
        positions: program.positions.clone(),
        instructions: vec![
            MotionInstruction::circular(PointRef::Local(2), PointRef::Local(3), 0.25).with_frames(Some(0), None),
        ],
    };

    let executor = MotionInstructionExecutor::new(&registers, &frames);
    drive(arm, &mut ProgramRunner::new(single_step), &executor, &program, max_ticks)?;

    let outcome = arm.toggle_ee_state(&mut registers, &scene);
    println!("Gripper: {:?}", outcome);

    let executor = MotionInstructionExecutor::new(&registers, &frames);
    drive(arm, &mut ProgramRunner::new(single_step), &executor, &carry, max_ticks)?;
    println!("Holding {:?} at:", arm.held());
    dump_pose(&arm.flange_pose());
    Ok(())
}

/// Pose of the claw tip when the flange is at `flange`.
fn tcp_of(flange: &Pose) -> Pose {
    flange * Translation3::new(0.0, 0.0, 0.085)
}

fn drive(arm: &mut ArmController, runner: &mut ProgramRunner, executor: &MotionInstructionExecutor,
         program: &Program, max_ticks: usize) -> Result<()> {
    for _ in 0..max_ticks {
        match runner.update(arm, executor, program).clone() {
            RunnerState::Finished => {
                info!("{} done at {}", program.name, format_joints(&arm.joint_angles()));
                return Ok(());
            }
            RunnerState::Stopped(err) => bail!("Program {} stopped: {}", program.name, err),
            RunnerState::Paused => {
                print!("After instruction {}: ", runner.next_instruction());
                dump_joints(&arm.joint_angles());
                runner.resume();
            }
            RunnerState::Running => {}
        }
        arm.tick(1.0);
    }
    bail!("Program {} did not finish in {} ticks", program.name, max_ticks)
}

fn jog(arm: &mut ArmController, frame: JogMode, rates: &[f64], ticks: usize) -> Result<()> {
    let [x, y, z] = rates else {
        bail!("Three jog rates expected, got {}", rates.len());
    };
    arm.set_joint_angles(&[0.0, 0.3, 0.6, 0.0, 0.5, 0.0]);
    match frame {
        JogMode::Joint => {
            for (joint, rate) in [*x, *y, *z].into_iter().enumerate() {
                arm.set_joint_jog(joint, rate);
            }
        }
        JogMode::World | JogMode::Tool => {
            let jog_frame = match frame {
                JogMode::Tool => JogFrame::Tool(Frame::from_isometry(&arm.flange_pose())),
                _ => JogFrame::World,
            };
            arm.set_jog_frame(jog_frame);
            arm.set_linear_jog(Vector3::new(*x, *y, *z));
        }
    }

    for _ in 0..ticks {
        arm.tick(1.0);
        if arm.is_faulted() || arm.jog_abort().is_some() {
            break;
        }
    }
    if let Some(fault) = arm.fault() {
        println!("Faulted: {}", fault);
    }
    if let Some(abort) = arm.jog_abort() {
        println!("{}", abort);
    }
    dump_joints(&arm.joint_angles());
    dump_pose(&arm.flange_pose());
    Ok(())
}
