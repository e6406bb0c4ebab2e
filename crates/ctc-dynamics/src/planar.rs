//! 平面串联链参考模型
//!
//! n 个转动关节在 x-y 平面内串联，每个连杆的质量集中在连杆末端，
//! 另可附加绕 z 轴的转动惯量。重力沿 -y 方向。
//!
//! 记 θ_i = Σ_{j≤i} q_j，ω_i = Σ_{j≤i} qd_j，则第 k 个质点位置
//! p_k = Σ_{i≤k} l_i·(cos θ_i, sin θ_i)，其对 q_j（j ≤ k）的偏导为
//! Σ_{i=j..k} l_i·(-sin θ_i, cos θ_i)。

use crate::error::ModelError;
use crate::model::DynamicsModel;
use crate::snapshot::{DynamicsSnapshot, Requirements};
use ctc_types::nalgebra::{Isometry3, Vector3};
use ctc_types::{JointSet, JointState};
use serde::Deserialize;
use std::path::Path;

/// 标准重力加速度
pub const STANDARD_GRAVITY: f64 = 9.81;

/// 单个连杆的描述
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkDescription {
    /// 驱动该连杆的关节名
    pub name: String,
    /// 连杆长度（m）
    pub length: f64,
    /// 末端质点质量（kg）
    pub mass: f64,
    /// 绕 z 轴的转动惯量（kg·m²）
    #[serde(default)]
    pub inertia: f64,
}

/// 平面链的机构描述（TOML）
///
/// ```toml
/// gravity = 9.81
///
/// [[links]]
/// name = "shoulder"
/// length = 0.5
/// mass = 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainDescription {
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    pub links: Vec<LinkDescription>,
}

fn default_gravity() -> f64 {
    STANDARD_GRAVITY
}

impl ChainDescription {
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        toml::from_str(text).map_err(|e| ModelError::Description(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Description(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}

/// 平面链构建器
#[derive(Debug, Clone)]
pub struct PlanarChainBuilder {
    links: Vec<LinkDescription>,
    gravity: f64,
}

impl PlanarChainBuilder {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            gravity: STANDARD_GRAVITY,
        }
    }

    /// 追加一个连杆
    pub fn link(mut self, name: impl Into<String>, length: f64, mass: f64) -> Self {
        self.links.push(LinkDescription {
            name: name.into(),
            length,
            mass,
            inertia: 0.0,
        });
        self
    }

    /// 为最后追加的连杆设置转动惯量
    pub fn inertia(mut self, inertia: f64) -> Self {
        if let Some(link) = self.links.last_mut() {
            link.inertia = inertia;
        }
        self
    }

    pub fn gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn build(self) -> Result<PlanarChain, ModelError> {
        PlanarChain::from_description(ChainDescription {
            gravity: self.gravity,
            links: self.links,
        })
    }
}

impl Default for PlanarChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Link {
    length: f64,
    mass: f64,
    inertia: f64,
}

/// 每次求值复用的工作区
#[derive(Debug, Clone)]
struct Workspace {
    /// 绝对角 θ_i 的 (cos, sin)
    direction: Vec<[f64; 2]>,
    /// 绝对角速度 ω_i
    omega: Vec<f64>,
    /// 当前质点的平移 Jacobian 列
    columns: Vec<[f64; 2]>,
}

/// 平面串联链
#[derive(Debug, Clone)]
pub struct PlanarChain {
    names: Vec<String>,
    links: Vec<Link>,
    gravity: f64,
    workspace: Workspace,
}

impl PlanarChain {
    pub fn builder() -> PlanarChainBuilder {
        PlanarChainBuilder::new()
    }

    /// n 个相同连杆，关节名为 `joint_1` … `joint_n`
    pub fn uniform(dof: usize, length: f64, mass: f64) -> Result<Self, ModelError> {
        (1..=dof)
            .fold(Self::builder(), |builder, i| {
                builder.link(format!("joint_{i}"), length, mass)
            })
            .build()
    }

    pub fn from_description(description: ChainDescription) -> Result<Self, ModelError> {
        if description.links.is_empty() {
            return Err(ModelError::InvalidParameter {
                link: String::new(),
                reason: "chain has no links".to_string(),
            });
        }
        if !description.gravity.is_finite() {
            return Err(ModelError::InvalidParameter {
                link: String::new(),
                reason: format!("gravity must be finite, got {}", description.gravity),
            });
        }

        // 关节名唯一性复用 JointSet 的校验
        JointSet::new(description.links.iter().map(|l| l.name.as_str())).map_err(|e| {
            ModelError::InvalidParameter {
                link: String::new(),
                reason: e.to_string(),
            }
        })?;

        for link in &description.links {
            let invalid = |reason: String| ModelError::InvalidParameter {
                link: link.name.clone(),
                reason,
            };
            if !(link.length.is_finite() && link.length > 0.0) {
                return Err(invalid(format!("length must be positive, got {}", link.length)));
            }
            if !(link.mass.is_finite() && link.mass > 0.0) {
                return Err(invalid(format!("mass must be positive, got {}", link.mass)));
            }
            if !(link.inertia.is_finite() && link.inertia >= 0.0) {
                return Err(invalid(format!(
                    "inertia must be non-negative, got {}",
                    link.inertia
                )));
            }
        }

        let dof = description.links.len();
        Ok(Self {
            names: description.links.iter().map(|l| l.name.clone()).collect(),
            links: description
                .links
                .iter()
                .map(|l| Link {
                    length: l.length,
                    mass: l.mass,
                    inertia: l.inertia,
                })
                .collect(),
            gravity: description.gravity,
            workspace: Workspace {
                direction: vec![[1.0, 0.0]; dof],
                omega: vec![0.0; dof],
                columns: vec![[0.0, 0.0]; dof],
            },
        })
    }

    /// 所有连杆长度之和（工作空间半径）
    pub fn reach(&self) -> f64 {
        self.links.iter().map(|l| l.length).sum()
    }

    /// 正运动学：末端在平面内的位置和朝向角
    pub fn end_effector(&self, positions: &[f64]) -> ([f64; 2], f64) {
        let mut theta = 0.0;
        let mut tip = [0.0, 0.0];
        for (link, q) in self.links.iter().zip(positions) {
            theta += q;
            tip[0] += link.length * theta.cos();
            tip[1] += link.length * theta.sin();
        }
        (tip, theta)
    }

    /// 末端位姿（平面位置 + 绕 z 轴的转角）
    pub fn pose(&self, positions: &[f64]) -> Isometry3<f64> {
        let (tip, theta) = self.end_effector(positions);
        Isometry3::new(Vector3::new(tip[0], tip[1], 0.0), Vector3::z() * theta)
    }

    /// 系统总能量（动能 + 势能），用于仿真检查
    pub fn energy(&self, state: &JointState) -> Result<f64, ModelError> {
        let expected = self.links.len();
        for actual in [state.len(), state.velocities.len()] {
            if actual != expected {
                return Err(ModelError::DimensionMismatch { expected, actual });
            }
        }

        let mut theta = 0.0;
        let mut omega = 0.0;
        let mut position = [0.0, 0.0];
        let mut velocity = [0.0, 0.0];
        let mut energy = 0.0;
        for (i, link) in self.links.iter().enumerate() {
            theta += state.positions[i];
            omega += state.velocities[i];
            position[0] += link.length * theta.cos();
            position[1] += link.length * theta.sin();
            velocity[0] -= link.length * omega * theta.sin();
            velocity[1] += link.length * omega * theta.cos();
            energy += 0.5 * link.mass * (velocity[0].powi(2) + velocity[1].powi(2))
                + 0.5 * link.inertia * omega.powi(2)
                + link.mass * self.gravity * position[1];
        }
        Ok(energy)
    }

    fn check_dimensions(
        &self,
        state: &JointState,
        snapshot: &DynamicsSnapshot,
    ) -> Result<(), ModelError> {
        let expected = self.links.len();
        for actual in [state.len(), state.velocities.len(), snapshot.dof()] {
            if actual != expected {
                return Err(ModelError::DimensionMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

impl DynamicsModel for PlanarChain {
    fn joint_names(&self) -> &[String] {
        &self.names
    }

    fn capabilities(&self) -> Requirements {
        Requirements::TASK_POSE
    }

    fn evaluate(
        &mut self,
        state: &JointState,
        snapshot: &mut DynamicsSnapshot,
    ) -> Result<(), ModelError> {
        self.check_dimensions(state, snapshot)?;
        let n = self.links.len();
        let ws = &mut self.workspace;

        let mut theta = 0.0;
        let mut omega = 0.0;
        for i in 0..n {
            theta += state.positions[i];
            omega += state.velocities[i];
            ws.direction[i] = [theta.cos(), theta.sin()];
            ws.omega[i] = omega;
        }

        snapshot.mass_matrix.fill(0.0);
        snapshot.coriolis.set_zero();
        snapshot.gravity.set_zero();

        // 速度乘积项 J̇_k·qd = Σ_{i≤k} -l_i·ω_i²·(cos θ_i, sin θ_i)
        let mut bias = [0.0, 0.0];
        for k in 0..n {
            let link = &self.links[k];
            let [c, s] = ws.direction[k];
            let w2 = ws.omega[k] * ws.omega[k];
            bias[0] -= link.length * w2 * c;
            bias[1] -= link.length * w2 * s;

            // 质点 k 的 Jacobian 列，从 k 向 0 累加
            let mut acc = [0.0, 0.0];
            for j in (0..=k).rev() {
                let [cj, sj] = ws.direction[j];
                acc[0] -= self.links[j].length * sj;
                acc[1] += self.links[j].length * cj;
                ws.columns[j] = acc;
            }

            for a in 0..=k {
                let col_a = ws.columns[a];
                for b in 0..=k {
                    let col_b = ws.columns[b];
                    snapshot.mass_matrix[(a, b)] +=
                        link.mass * (col_a[0] * col_b[0] + col_a[1] * col_b[1]) + link.inertia;
                }
                snapshot.coriolis[a] += link.mass * (col_a[0] * bias[0] + col_a[1] * bias[1]);
                snapshot.gravity[a] += link.mass * self.gravity * col_a[1];
            }
        }

        // 循环结束时 columns 保存的就是末端质点（末端执行器）的平移 Jacobian
        if let Some(jacobian) = snapshot.jacobian.as_mut() {
            jacobian.fill(0.0);
            for j in 0..n {
                jacobian[(0, j)] = ws.columns[j][0];
                jacobian[(1, j)] = ws.columns[j][1];
                jacobian[(5, j)] = 1.0;
            }
        }

        if let Some(pose) = snapshot.pose.as_mut() {
            let mut tip = [0.0, 0.0];
            for (link, [c, s]) in self.links.iter().zip(&ws.direction) {
                tip[0] += link.length * c;
                tip[1] += link.length * s;
            }
            *pose = Isometry3::new(Vector3::new(tip[0], tip[1], 0.0), Vector3::z() * theta);
        }

        Ok(())
    }
}
