//! 控制器变体与生命周期
//!
//! 所有变体共享同一个 [`ComputedTorqueController`]，区别只在
//! [`SetpointMode`]：设定值类型、激活时如何播种、每周期如何生成
//! [`JointReference`]。宿主只通过 [`Controller`] 的四个调用驱动控制器。

use crate::config::{ControllerConfig, ResolvedJoints};
use crate::error::{ControlError, CycleFault, InitError};
use crate::law::{ComputedTorqueLaw, JointReference};
use crate::lifecycle::{AtomicLifecycle, LifecycleState};
use crate::metrics::ControllerMetrics;
use crate::resolver::{DampedResolver, pose_error};
use crate::saturation::{PositionLimits, TwistLimits};
use crate::setpoint::SetpointWriter;
use ctc_dynamics::{DynamicsModel, DynamicsSnapshot, ModelError, Requirements, SnapshotFault};
use ctc_realtime::{ChannelMetrics, RealtimeReader, RealtimeWriter, realtime_buffer};
use ctc_types::{EffortCommand, JointSet, JointState, JointVector, Pose, Twist};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};

/// 宿主运行时看到的控制器接口
pub trait Controller {
    /// Uninitialized → Ready：加载增益、固定关节集合、绑定动力学模型
    fn init(
        &mut self,
        config: &ControllerConfig,
        model: Box<dyn DynamicsModel>,
    ) -> Result<(), InitError>;

    /// Ready → Running：用测量状态播种设定值
    fn activate(&mut self, state: &JointState) -> Result<(), ControlError>;

    /// 计算一个周期的力矩（仅 Running）
    ///
    /// 运行期故障不会返回错误：该周期输出全零力矩，故障通过指标和日志报告。
    fn update(
        &mut self,
        state: &JointState,
        period: Duration,
    ) -> Result<&EffortCommand, ControlError>;

    /// Running → Ready：返回最后一条全零力矩命令，宿主必须把它发给硬件
    fn deactivate(&mut self) -> Result<&EffortCommand, ControlError>;

    /// 当前生命周期状态
    fn state(&self) -> LifecycleState;

    /// 控制器关节顺序（Ready 之后可用）
    fn joints(&self) -> Option<&JointSet>;
}

/// 设定值模式
///
/// 决定一个控制器变体接受什么设定值，以及如何把它变成控制律的参考输入。
pub trait SetpointMode: Send + Sized + 'static {
    /// 设定值类型（经实时通道传递）
    type Setpoint: Clone + Send + fmt::Debug + 'static;

    /// 用于日志
    const NAME: &'static str;

    /// 对动力学模型的需求
    const REQUIREMENTS: Requirements;

    fn from_config(config: &ControllerConfig, resolved: &ResolvedJoints) -> Self;

    /// 首次写入之前通道中的值
    fn initial_setpoint(dof: usize) -> Self::Setpoint;

    /// 激活时播种：使第一个周期的反馈项为零
    fn seed(
        &mut self,
        state: &JointState,
        dynamics: &DynamicsSnapshot,
        setpoint: &mut Self::Setpoint,
    );

    /// 生成本周期的参考输入，返回设定值是否被限幅
    fn reference(
        &mut self,
        setpoint: &Self::Setpoint,
        state: &JointState,
        dynamics: &DynamicsSnapshot,
        period: Duration,
        reference: &mut JointReference,
    ) -> Result<bool, CycleFault>;
}

/// 关节位置设定值：q_des = 限幅后的设定值，qd_des = 0
///
/// 激活时越限的关节以激活位置为界放宽限位，保持该位置不产生反馈；
/// 设定值回到限位范围内后放宽的部分随之收回。
#[derive(Debug, Clone)]
pub struct JointPositionMode {
    limits: PositionLimits,
    envelope: PositionLimits,
}

impl SetpointMode for JointPositionMode {
    type Setpoint = JointVector;
    const NAME: &'static str = "joint-position";
    const REQUIREMENTS: Requirements = Requirements::JOINT_SPACE;

    fn from_config(_config: &ControllerConfig, resolved: &ResolvedJoints) -> Self {
        Self {
            limits: resolved.limits.clone(),
            envelope: resolved.limits.clone(),
        }
    }

    fn initial_setpoint(dof: usize) -> JointVector {
        JointVector::zeros(dof)
    }

    fn seed(
        &mut self,
        state: &JointState,
        _dynamics: &DynamicsSnapshot,
        setpoint: &mut JointVector,
    ) {
        setpoint.clone_from(&state.positions);
        self.envelope.widen_from(&self.limits, &state.positions);
    }

    fn reference(
        &mut self,
        setpoint: &JointVector,
        _state: &JointState,
        _dynamics: &DynamicsSnapshot,
        _period: Duration,
        reference: &mut JointReference,
    ) -> Result<bool, CycleFault> {
        reference.position.clone_from(setpoint);
        reference.velocity.set_zero();
        let saturated = self.envelope.clamp(&mut reference.position);
        self.envelope.widen_from(&self.limits, &reference.position);
        Ok(saturated)
    }
}

/// 关节速度设定值
///
/// q_des 从激活时的测量位置开始按 qd_des·dt 积分，qd_des = 设定值。
/// 越限处理与 [`JointPositionMode`] 相同。
#[derive(Debug, Clone)]
pub struct JointVelocityMode {
    limits: PositionLimits,
    envelope: PositionLimits,
    target: JointVector,
}

impl SetpointMode for JointVelocityMode {
    type Setpoint = JointVector;
    const NAME: &'static str = "joint-velocity";
    const REQUIREMENTS: Requirements = Requirements::JOINT_SPACE;

    fn from_config(_config: &ControllerConfig, resolved: &ResolvedJoints) -> Self {
        Self {
            limits: resolved.limits.clone(),
            envelope: resolved.limits.clone(),
            target: JointVector::zeros(resolved.joints.len()),
        }
    }

    fn initial_setpoint(dof: usize) -> JointVector {
        JointVector::zeros(dof)
    }

    fn seed(
        &mut self,
        state: &JointState,
        _dynamics: &DynamicsSnapshot,
        setpoint: &mut JointVector,
    ) {
        self.target.clone_from(&state.positions);
        self.envelope.widen_from(&self.limits, &state.positions);
        setpoint.set_zero();
    }

    fn reference(
        &mut self,
        setpoint: &JointVector,
        _state: &JointState,
        _dynamics: &DynamicsSnapshot,
        period: Duration,
        reference: &mut JointReference,
    ) -> Result<bool, CycleFault> {
        let dt = period.as_secs_f64();
        for (target, velocity) in self.target.iter_mut().zip(setpoint.iter()) {
            *target += velocity * dt;
        }
        let saturated = self.envelope.clamp(&mut self.target);
        self.envelope.widen_from(&self.limits, &self.target);
        reference.position.clone_from(&self.target);
        reference.velocity.clone_from(setpoint);
        Ok(saturated)
    }
}

/// 任务空间速度设定值
///
/// qd_des 由阻尼伪逆解析；q_des = q，位置误差项恒为零。
#[derive(Debug, Clone)]
pub struct TaskVelocityMode {
    resolver: DampedResolver,
    limits: TwistLimits,
}

impl SetpointMode for TaskVelocityMode {
    type Setpoint = Twist;
    const NAME: &'static str = "task-velocity";
    const REQUIREMENTS: Requirements = Requirements::TASK_VELOCITY;

    fn from_config(config: &ControllerConfig, _resolved: &ResolvedJoints) -> Self {
        Self {
            resolver: DampedResolver::new(config.task_space.damping),
            limits: config.twist_limits(),
        }
    }

    fn initial_setpoint(_dof: usize) -> Twist {
        Twist::zero()
    }

    fn seed(
        &mut self,
        _state: &JointState,
        _dynamics: &DynamicsSnapshot,
        setpoint: &mut Twist,
    ) {
        *setpoint = Twist::zero();
    }

    fn reference(
        &mut self,
        setpoint: &Twist,
        state: &JointState,
        dynamics: &DynamicsSnapshot,
        _period: Duration,
        reference: &mut JointReference,
    ) -> Result<bool, CycleFault> {
        let mut twist = *setpoint;
        let saturated = self.limits.clamp(&mut twist);
        let jacobian = dynamics
            .jacobian
            .as_ref()
            .ok_or(CycleFault::Snapshot(SnapshotFault::MissingJacobian))?;
        self.resolver
            .resolve(jacobian, &twist, &mut reference.velocity)?;
        reference.position.clone_from(&state.positions);
        Ok(saturated)
    }
}

/// 任务空间位姿设定值
///
/// 期望速度 = Kp_task ⊙ 位姿误差，限幅后与速度变体相同。
#[derive(Debug, Clone)]
pub struct TaskPoseMode {
    resolver: DampedResolver,
    limits: TwistLimits,
    gains: Twist,
}

impl SetpointMode for TaskPoseMode {
    type Setpoint = Pose;
    const NAME: &'static str = "task-pose";
    const REQUIREMENTS: Requirements = Requirements::TASK_POSE;

    fn from_config(config: &ControllerConfig, _resolved: &ResolvedJoints) -> Self {
        Self {
            resolver: DampedResolver::new(config.task_space.damping),
            limits: config.twist_limits(),
            gains: config.task_gains(),
        }
    }

    fn initial_setpoint(_dof: usize) -> Pose {
        Pose::identity()
    }

    fn seed(
        &mut self,
        _state: &JointState,
        dynamics: &DynamicsSnapshot,
        setpoint: &mut Pose,
    ) {
        if let Some(pose) = dynamics.pose {
            *setpoint = pose;
        }
    }

    fn reference(
        &mut self,
        setpoint: &Pose,
        state: &JointState,
        dynamics: &DynamicsSnapshot,
        _period: Duration,
        reference: &mut JointReference,
    ) -> Result<bool, CycleFault> {
        let current = dynamics
            .pose
            .as_ref()
            .ok_or(CycleFault::Snapshot(SnapshotFault::MissingPose))?;
        let error = pose_error(current, setpoint);
        let mut twist = Twist::new(
            self.gains.linear.component_mul(&error.linear),
            self.gains.angular.component_mul(&error.angular),
        );
        let saturated = self.limits.clamp(&mut twist);
        let jacobian = dynamics
            .jacobian
            .as_ref()
            .ok_or(CycleFault::Snapshot(SnapshotFault::MissingJacobian))?;
        self.resolver
            .resolve(jacobian, &twist, &mut reference.velocity)?;
        reference.position.clone_from(&state.positions);
        Ok(saturated)
    }
}

/// 关节位置控制器
pub type JointPositionController = ComputedTorqueController<JointPositionMode>;
/// 关节速度控制器
pub type JointVelocityController = ComputedTorqueController<JointVelocityMode>;
/// 任务空间速度控制器
pub type TaskVelocityController = ComputedTorqueController<TaskVelocityMode>;
/// 任务空间位姿控制器
pub type TaskPoseController = ComputedTorqueController<TaskPoseMode>;

/// Ready 之后才存在的部分，全部在 init 时分配
struct Bound<M: SetpointMode> {
    joints: JointSet,
    model: Box<dyn DynamicsModel>,
    mode: M,
    law: ComputedTorqueLaw,
    snapshot: DynamicsSnapshot,
    reference: JointReference,
    effort: EffortCommand,
    writer: RealtimeWriter<M::Setpoint>,
    reader: RealtimeReader<M::Setpoint>,
    last_fault: Option<CycleFault>,
    /// 最近一次模型求值失败的原因，只在故障边沿记录日志时取出
    model_error: Option<ModelError>,
    saturated: bool,
}

impl<M: SetpointMode> Bound<M> {
    /// 一个周期的计算；失败时由调用方输出零力矩
    fn cycle(&mut self, state: &JointState, period: Duration) -> Result<bool, CycleFault> {
        if !state.is_finite() {
            return Err(CycleFault::NonFiniteState);
        }

        if let Err(err) = self.model.evaluate(state, &mut self.snapshot) {
            self.model_error = Some(err);
            return Err(CycleFault::ModelFailure);
        }
        self.snapshot.validate()?;

        let setpoint = self.reader.read();
        let saturated = self.mode.reference(
            setpoint,
            state,
            &self.snapshot,
            period,
            &mut self.reference,
        )?;
        self.law
            .compute(&self.reference, state, &self.snapshot, &mut self.effort)?;
        Ok(saturated)
    }

    fn check_dimensions(&self, state: &JointState) -> Result<(), ControlError> {
        let expected = self.joints.len();
        for actual in [state.positions.len(), state.velocities.len()] {
            if actual != expected {
                return Err(ControlError::StateDimension { expected, actual });
            }
        }
        Ok(())
    }
}

/// 计算力矩控制器
///
/// 在实时线程上由宿主独占使用；设定值经 [`setpoint_writer`](Self::setpoint_writer)
/// 从其他线程写入，生命周期状态和指标可通过共享的 `Arc` 在任意线程读取。
pub struct ComputedTorqueController<M: SetpointMode> {
    lifecycle: Arc<AtomicLifecycle>,
    metrics: Arc<ControllerMetrics>,
    bound: Option<Bound<M>>,
}

impl<M: SetpointMode> ComputedTorqueController<M> {
    pub fn new() -> Self {
        Self {
            lifecycle: Arc::new(AtomicLifecycle::new(LifecycleState::Uninitialized)),
            metrics: Arc::new(ControllerMetrics::new()),
            bound: None,
        }
    }

    /// 变体名
    pub fn mode_name(&self) -> &'static str {
        M::NAME
    }

    /// 共享的生命周期状态
    pub fn lifecycle(&self) -> &Arc<AtomicLifecycle> {
        &self.lifecycle
    }

    /// 共享的控制器指标
    pub fn metrics(&self) -> &Arc<ControllerMetrics> {
        &self.metrics
    }

    /// 设定值通道指标（Ready 之后可用）
    pub fn channel_metrics(&self) -> Option<&Arc<ChannelMetrics>> {
        self.bound.as_ref().map(|b| b.reader.metrics())
    }

    /// 设定值写端（Ready 之后可用）
    pub fn setpoint_writer(&self) -> Option<SetpointWriter<M::Setpoint>> {
        self.bound
            .as_ref()
            .map(|b| SetpointWriter::new(b.joints.clone(), b.writer.clone()))
    }

    /// 最近一个周期的故障（正常周期后清除）
    pub fn last_fault(&self) -> Option<CycleFault> {
        self.bound.as_ref().and_then(|b| b.last_fault)
    }

    /// 最近一个周期的参考输入
    pub fn reference(&self) -> Option<&JointReference> {
        self.bound.as_ref().map(|b| &b.reference)
    }

    /// 最近一个周期的动力学快照
    pub fn dynamics(&self) -> Option<&DynamicsSnapshot> {
        self.bound.as_ref().map(|b| &b.snapshot)
    }

    /// 控制增益（Ready 之后可用）
    pub fn gains(&self) -> Option<&ctc_types::ControlGains> {
        self.bound.as_ref().map(|b| b.law.gains())
    }

    fn transition_error(&self, operation: &'static str) -> ControlError {
        ControlError::InvalidTransition {
            operation,
            state: self.state(),
        }
    }
}

impl<M: SetpointMode> Default for ComputedTorqueController<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: SetpointMode> fmt::Debug for ComputedTorqueController<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedTorqueController")
            .field("mode", &M::NAME)
            .field("state", &self.state())
            .field("joints", &self.joints())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

impl<M: SetpointMode> Controller for ComputedTorqueController<M> {
    fn init(
        &mut self,
        config: &ControllerConfig,
        model: Box<dyn DynamicsModel>,
    ) -> Result<(), InitError> {
        let state = self.state();
        if state != LifecycleState::Uninitialized {
            return Err(InitError::AlreadyInitialized(state));
        }

        let result = bind::<M>(config, model);
        match result {
            Ok(bound) => {
                info!(
                    mode = M::NAME,
                    joints = %bound.joints,
                    control_rate = config.control_rate,
                    "controller initialized"
                );
                self.bound = Some(bound);
                self.lifecycle.set(LifecycleState::Ready, Ordering::Release);
                Ok(())
            },
            Err(err) => {
                error!(mode = M::NAME, error = %err, "controller initialization failed");
                Err(err)
            },
        }
    }

    fn activate(&mut self, state: &JointState) -> Result<(), ControlError> {
        if self.state() != LifecycleState::Ready {
            return Err(self.transition_error("activate"));
        }
        let Some(bound) = self.bound.as_mut() else {
            return Err(self.transition_error("activate"));
        };
        bound.check_dimensions(state)?;
        if !state.is_finite() {
            return Err(ControlError::NonFiniteState);
        }

        // 位姿变体需要测量位姿来播种
        if M::REQUIREMENTS.pose {
            bound
                .model
                .evaluate(state, &mut bound.snapshot)
                .map_err(|err| {
                    warn!(error = %err, "dynamics model evaluation failed during activation");
                    ControlError::Activation(CycleFault::ModelFailure)
                })?;
            bound
                .snapshot
                .validate()
                .map_err(|fault| ControlError::Activation(fault.into()))?;
        }

        let Bound {
            mode,
            snapshot,
            writer,
            ..
        } = &mut *bound;
        writer.write_with(|setpoint| mode.seed(state, snapshot, setpoint));

        bound.reference.hold(state);
        bound.effort.set_zero();
        bound.last_fault = None;
        bound.model_error = None;
        bound.saturated = false;

        self.metrics.activations.fetch_add(1, Ordering::Relaxed);
        self.metrics.consecutive_faults.store(0, Ordering::Relaxed);
        self.lifecycle.set(LifecycleState::Running, Ordering::Release);
        info!(mode = M::NAME, "controller activated");
        Ok(())
    }

    fn update(
        &mut self,
        state: &JointState,
        period: Duration,
    ) -> Result<&EffortCommand, ControlError> {
        let current = self.state();
        if current != LifecycleState::Running {
            return Err(ControlError::NotRunning(current));
        }
        let Some(bound) = self.bound.as_mut() else {
            return Err(ControlError::NotRunning(current));
        };
        bound.check_dimensions(state)?;

        match bound.cycle(state, period) {
            Ok(saturated) => {
                let streak = self.metrics.record_ok();
                if streak > 0 {
                    info!(faulted_cycles = streak, "control cycle recovered");
                }
                bound.last_fault = None;

                if saturated {
                    self.metrics.saturated_cycles.fetch_add(1, Ordering::Relaxed);
                    if !bound.saturated {
                        warn!(mode = M::NAME, "setpoint saturated");
                    }
                }
                bound.saturated = saturated;
            },
            Err(fault) => {
                bound.effort.set_zero();
                let streak = self.metrics.record_fault(fault.code());
                let model_error = bound.model_error.take();
                if streak == 0 || bound.last_fault != Some(fault) {
                    match model_error {
                        Some(err) => warn!(
                            %fault,
                            code = fault.code(),
                            error = %err,
                            "control cycle faulted, commanding zero effort"
                        ),
                        None => warn!(
                            %fault,
                            code = fault.code(),
                            "control cycle faulted, commanding zero effort"
                        ),
                    }
                }
                bound.last_fault = Some(fault);
            },
        }
        Ok(&bound.effort)
    }

    fn deactivate(&mut self) -> Result<&EffortCommand, ControlError> {
        let current = self.state();
        let invalid = ControlError::InvalidTransition {
            operation: "deactivate",
            state: current,
        };
        if current != LifecycleState::Running {
            return Err(invalid);
        }
        let Some(bound) = self.bound.as_mut() else {
            return Err(invalid);
        };

        bound.effort.set_zero();
        self.metrics.deactivations.fetch_add(1, Ordering::Relaxed);
        self.lifecycle.set(LifecycleState::Ready, Ordering::Release);
        info!(mode = M::NAME, "controller deactivated, commanding zero effort");
        Ok(&bound.effort)
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.get(Ordering::Acquire)
    }

    fn joints(&self) -> Option<&JointSet> {
        self.bound.as_ref().map(|b| &b.joints)
    }
}

/// 校验配置和模型，分配所有实时路径需要的缓冲区
fn bind<M: SetpointMode>(
    config: &ControllerConfig,
    model: Box<dyn DynamicsModel>,
) -> Result<Bound<M>, InitError> {
    let resolved = config.resolve(model.joint_names())?;
    if model.dof() != resolved.joints.len() {
        return Err(InitError::Model(ModelError::DimensionMismatch {
            expected: resolved.joints.len(),
            actual: model.dof(),
        }));
    }

    let capabilities = model.capabilities();
    if !M::REQUIREMENTS.is_satisfied_by(capabilities) {
        let missing = if M::REQUIREMENTS.jacobian && !capabilities.jacobian {
            "a Jacobian"
        } else {
            "an end-effector pose"
        };
        return Err(InitError::ModelCapability(missing));
    }

    let n = resolved.joints.len();
    let mode = M::from_config(config, &resolved);
    let (writer, reader) = realtime_buffer(M::initial_setpoint(n));
    Ok(Bound {
        joints: resolved.joints,
        model,
        mode,
        law: ComputedTorqueLaw::new(resolved.gains),
        snapshot: DynamicsSnapshot::new(n, M::REQUIREMENTS),
        reference: JointReference::zeros(n),
        effort: EffortCommand::zeros(n),
        writer,
        reader,
        last_fault: None,
        model_error: None,
        saturated: false,
    })
}
