//! 控制循环与仿真闭环测试

use ctc_control::{
    ControlLoop, Controller, ControllerConfig, Hardware, JointConfig, JointPositionController,
    LoopConfig, LoopError, Pacing, SimulatedArm, SimulationError, TaskPoseController,
    TaskSpaceConfig,
};
use ctc_dynamics::PlanarChain;
use ctc_types::nalgebra::Vector3;
use ctc_types::{EffortCommand, JointState, Pose};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn config(dof: usize, kp: f64, kd: f64) -> ControllerConfig {
    ControllerConfig {
        control_rate: 1000.0,
        joints: (1..=dof)
            .map(|i| JointConfig {
                name: format!("joint_{i}"),
                kp,
                kd,
                min_position: None,
                max_position: None,
            })
            .collect(),
        task_space: TaskSpaceConfig::default(),
    }
}

fn chain(dof: usize) -> PlanarChain {
    PlanarChain::uniform(dof, 0.4, 1.2).unwrap()
}

fn simulated(iterations: usize) -> ControlLoop {
    ControlLoop::new(LoopConfig {
        max_iterations: Some(iterations),
        pacing: Pacing::Simulated,
        ..LoopConfig::default()
    })
}

/// 记录所有力矩命令，并在每次读状态时执行一个回调（模拟设定值生产者）
struct Recording<F: FnMut()> {
    arm: SimulatedArm<PlanarChain>,
    commands: Vec<EffortCommand>,
    on_read: F,
}

impl<F: FnMut()> Recording<F> {
    fn new(dof: usize, initial: JointState, on_read: F) -> Self {
        Self {
            arm: SimulatedArm::new(chain(dof), initial, Duration::from_millis(1)).unwrap(),
            commands: Vec::new(),
            on_read,
        }
    }
}

impl<F: FnMut()> Hardware for Recording<F> {
    type Error = SimulationError;

    fn read_state(&mut self, state: &mut JointState) -> Result<(), SimulationError> {
        (self.on_read)();
        self.arm.read_state(state)
    }

    fn write_effort(&mut self, effort: &EffortCommand) -> Result<(), SimulationError> {
        self.commands.push(effort.clone());
        self.arm.write_effort(effort)
    }
}

#[test]
fn test_deactivation_ends_with_zero_command() {
    let mut controller = JointPositionController::new();
    controller.init(&config(3, 100.0, 20.0), Box::new(chain(3))).unwrap();
    let writer = controller.setpoint_writer().unwrap();

    let initial = JointState::new([0.2, 0.3, -0.1], [0.0, 0.0, 0.0]).unwrap();
    let mut hardware = Recording::new(3, initial, move || {
        writer.write_all(&[0.6, -0.4, 0.3]).unwrap();
    });

    let report = simulated(3).run(&mut controller, &mut hardware).unwrap();
    assert_eq!(report.iterations, 3);
    assert!(!report.stopped);

    assert_eq!(hardware.commands.len(), 4);
    for command in &hardware.commands[..3] {
        assert!(!command.is_zero());
    }
    let last = hardware.commands.last().unwrap();
    assert!(last.efforts().iter().all(|v| *v == 0.0));
    assert!(hardware.arm.last_effort().is_zero());
    assert_eq!(controller.state(), ctc_control::LifecycleState::Ready);
}

#[test]
fn test_stop_handle_still_deactivates() {
    let mut controller = JointPositionController::new();
    controller.init(&config(2, 10.0, 2.0), Box::new(chain(2))).unwrap();
    let control_loop = ControlLoop::new(LoopConfig {
        pacing: Pacing::Simulated,
        ..LoopConfig::default()
    });
    control_loop.stop_handle().store(true, Ordering::Release);

    let mut arm = SimulatedArm::new(chain(2), JointState::zeros(2), Duration::from_millis(1))
        .unwrap();
    let report = control_loop.run(&mut controller, &mut arm).unwrap();
    assert!(report.stopped);
    assert_eq!(report.iterations, 0);
    assert_eq!(arm.commands_written(), 1);
    assert!(arm.last_effort().is_zero());
    assert_eq!(controller.metrics().snapshot().deactivations, 1);
}

#[test]
fn test_uninitialized_controller_rejected() {
    let mut controller = JointPositionController::new();
    let mut arm = SimulatedArm::new(chain(2), JointState::zeros(2), Duration::from_millis(1))
        .unwrap();
    let err = simulated(10).run(&mut controller, &mut arm).unwrap_err();
    assert!(matches!(err, LoopError::NotInitialized));
    assert_eq!(arm.commands_written(), 0);
}

#[test]
fn test_invalid_loop_config_rejected() {
    let mut controller = JointPositionController::new();
    controller.init(&config(2, 10.0, 2.0), Box::new(chain(2))).unwrap();
    let mut arm = SimulatedArm::new(chain(2), JointState::zeros(2), Duration::from_millis(1))
        .unwrap();
    let control_loop = ControlLoop::new(LoopConfig {
        frequency_hz: -1.0,
        ..LoopConfig::default()
    });
    assert!(matches!(
        control_loop.run(&mut controller, &mut arm),
        Err(LoopError::Config(_))
    ));
}

#[test]
fn test_joint_position_tracking_converges() {
    let target = [0.5, -0.3, 0.2];
    let mut controller = JointPositionController::new();
    controller.init(&config(3, 100.0, 20.0), Box::new(chain(3))).unwrap();
    let writer = controller.setpoint_writer().unwrap();

    let mut hardware = Recording::new(3, JointState::zeros(3), move || {
        writer.write_all(&target).unwrap();
    });
    simulated(3000).run(&mut controller, &mut hardware).unwrap();

    let state = hardware.arm.state();
    for (actual, expected) in state.positions.iter().zip(target) {
        assert!((actual - expected).abs() < 1e-3, "{actual} vs {expected}");
    }
    assert!(state.velocities.iter().all(|v| v.abs() < 1e-2));
    assert_eq!(controller.metrics().snapshot().faulted_cycles, 0);
}

#[test]
fn test_task_pose_tracking_converges() {
    let initial = JointState::new([0.3, 0.6, -0.4], [0.0, 0.0, 0.0]).unwrap();
    let start = chain(3).pose(initial.positions.as_slice());
    let target = Pose::from_parts(
        (start.translation.vector + Vector3::new(-0.05, 0.05, 0.0)).into(),
        start.rotation,
    );

    let mut cfg = config(3, 100.0, 20.0);
    cfg.task_space.linear.kp = 5.0;
    cfg.task_space.angular.kp = 5.0;
    let mut controller = TaskPoseController::new();
    controller.init(&cfg, Box::new(chain(3))).unwrap();
    let writer = controller.setpoint_writer().unwrap();

    let mut hardware = Recording::new(3, initial, move || {
        writer.write_pose(target).unwrap();
    });
    simulated(4000).run(&mut controller, &mut hardware).unwrap();

    let reached = chain(3).pose(hardware.arm.state().positions.as_slice());
    let offset = reached.translation.vector - target.translation.vector;
    assert!(offset.norm() < 5e-3, "offset {offset}");
    assert!(reached.rotation.angle_to(&target.rotation) < 1e-2);
}
