//! 场景对象
//!
//! `SceneObject` 保存位置、旋转（弧度：pitch, yaw, roll）和缩放，
//! 以及由它们派生的方向向量和矩阵。位置和旋转同时以向量和 `[f32; 3]`
//! 两种形式缓存，任何修改都会同步更新两者并立即重新计算矩阵。
//!
//! 矩阵的含义由 `ObjectKind` 决定：
//! - 模型 / 光源 / 基础几何体：世界矩阵 `T * R * S`
//! - 精灵：像素空间世界矩阵，缩放到精灵尺寸
//! - 3D 相机：左手 look-at 视图矩阵
//! - 2D 相机：`T(-p) * R` 视图矩阵

use crate::math::{constants, matrix, Matrix4, Vector3};
use crate::renderer::device::{GpuMesh, TextureHandle};

const DEFAULT_FORWARD: Vector3 = Vector3::new(0.0, 0.0, 1.0);
const DEFAULT_BACKWARD: Vector3 = Vector3::new(0.0, 0.0, -1.0);
const DEFAULT_LEFT: Vector3 = Vector3::new(-1.0, 0.0, 0.0);
const DEFAULT_RIGHT: Vector3 = Vector3::new(1.0, 0.0, 0.0);
const DEFAULT_UP: Vector3 = Vector3::new(0.0, 1.0, 0.0);

/// 对象类别
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    Model,
    Light,
    /// 屏幕空间精灵，尺寸以像素计
    Sprite { width: f32, height: f32 },
    /// 立方体、天空盒、地面等程序生成的几何体
    Primitive,
    Camera3D,
    Camera2D,
}

/// 方向向量；`*_no_y` 变体忽略 pitch
#[derive(Debug, Clone, Copy, PartialEq)]
struct Directions {
    forward: Vector3,
    backward: Vector3,
    left: Vector3,
    right: Vector3,
    forward_no_y: Vector3,
    backward_no_y: Vector3,
    left_no_y: Vector3,
    right_no_y: Vector3,
}

impl Directions {
    fn from_rotation(pitch: f32, yaw: f32) -> Self {
        let full = matrix::rotation_roll_pitch_yaw(pitch, yaw, 0.0);
        let flat = matrix::rotation_roll_pitch_yaw(0.0, yaw, 0.0);
        let t = matrix::transform_normal;

        Self {
            forward: t(&full, &DEFAULT_FORWARD),
            backward: t(&full, &DEFAULT_BACKWARD),
            left: t(&full, &DEFAULT_LEFT),
            right: t(&full, &DEFAULT_RIGHT),
            forward_no_y: t(&flat, &DEFAULT_FORWARD),
            backward_no_y: t(&flat, &DEFAULT_BACKWARD),
            left_no_y: t(&flat, &DEFAULT_LEFT),
            right_no_y: t(&flat, &DEFAULT_RIGHT),
        }
    }
}

/// 场景对象
#[derive(Debug, Clone)]
pub struct SceneObject {
    name: String,
    kind: ObjectKind,

    pos_vector: Vector3,
    position: [f32; 3],
    rot_vector: Vector3,
    rotation: [f32; 3],
    scale: Vector3,

    directions: Directions,
    matrix: Matrix4,

    /// GPU 网格（相机没有网格）
    pub mesh: Option<GpuMesh>,
    /// 漫反射纹理
    pub texture: Option<TextureHandle>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        let mut object = Self {
            name: name.into(),
            kind,
            pos_vector: Vector3::zeros(),
            position: [0.0; 3],
            rot_vector: Vector3::zeros(),
            rotation: [0.0; 3],
            scale: Vector3::new(1.0, 1.0, 1.0),
            directions: Directions::from_rotation(0.0, 0.0),
            matrix: Matrix4::identity(),
            mesh: None,
            texture: None,
        };
        object.update_matrix();
        object
    }

    /// 附加网格和纹理
    pub fn with_mesh(mut self, mesh: GpuMesh, texture: Option<TextureHandle>) -> Self {
        self.mesh = Some(mesh);
        self.texture = texture;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    // ========== 位置 ==========

    pub fn position(&self) -> Vector3 {
        self.pos_vector
    }

    pub fn position_array(&self) -> [f32; 3] {
        self.position
    }

    pub fn set_position(&mut self, pos: Vector3) {
        self.pos_vector = pos;
        self.position = [pos.x, pos.y, pos.z];
        self.update_matrix();
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.set_position(Vector3::new(x, y, z));
    }

    pub fn adjust_position(&mut self, offset: Vector3) {
        self.set_position(self.pos_vector + offset);
    }

    pub fn adjust_position_xyz(&mut self, x: f32, y: f32, z: f32) {
        self.adjust_position(Vector3::new(x, y, z));
    }

    // ========== 旋转 ==========

    /// 旋转（弧度）：x = pitch, y = yaw, z = roll
    pub fn rotation(&self) -> Vector3 {
        self.rot_vector
    }

    pub fn rotation_array(&self) -> [f32; 3] {
        self.rotation
    }

    pub fn set_rotation(&mut self, rot: Vector3) {
        self.rot_vector = rot;
        self.rotation = [rot.x, rot.y, rot.z];
        self.update_matrix();
    }

    pub fn set_rotation_xyz(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.set_rotation(Vector3::new(pitch, yaw, roll));
    }

    pub fn adjust_rotation(&mut self, offset: Vector3) {
        self.set_rotation(self.rot_vector + offset);
    }

    pub fn adjust_rotation_xyz(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.adjust_rotation(Vector3::new(pitch, yaw, roll));
    }

    /// 朝向目标点
    ///
    /// 目标与当前位置相同时不做任何修改。
    pub fn set_look_at_pos(&mut self, target: Vector3) {
        if target == self.pos_vector {
            return;
        }

        let d = self.pos_vector - target;

        let pitch = if d.y != 0.0 {
            let distance = (d.x * d.x + d.z * d.z).sqrt();
            (d.y / distance).atan()
        } else {
            0.0
        };

        let mut yaw = 0.0;
        if d.x != 0.0 {
            yaw = if d.z != 0.0 {
                (d.x / d.z).atan()
            } else {
                // Δz = 0：取 Δz 从负方向趋于 0 时 atan(Δx/Δz) 的极限
                -d.x.signum() * constants::HALF_PI
            };
        }
        if d.z > 0.0 {
            yaw += constants::PI;
        }

        self.set_rotation(Vector3::new(pitch, yaw, 0.0));
    }

    // ========== 缩放 ==========

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.scale = Vector3::new(x, y, z);
        self.update_matrix();
    }

    // ========== 方向向量 ==========

    pub fn forward(&self, omit_y: bool) -> Vector3 {
        if omit_y { self.directions.forward_no_y } else { self.directions.forward }
    }

    pub fn backward(&self, omit_y: bool) -> Vector3 {
        if omit_y { self.directions.backward_no_y } else { self.directions.backward }
    }

    pub fn left(&self, omit_y: bool) -> Vector3 {
        if omit_y { self.directions.left_no_y } else { self.directions.left }
    }

    pub fn right(&self, omit_y: bool) -> Vector3 {
        if omit_y { self.directions.right_no_y } else { self.directions.right }
    }

    // ========== 矩阵 ==========

    /// 按类别解释的矩阵（见模块文档）
    pub fn matrix(&self) -> &Matrix4 {
        &self.matrix
    }

    fn rotation_matrix(&self) -> Matrix4 {
        matrix::rotation_roll_pitch_yaw(self.rot_vector.x, self.rot_vector.y, self.rot_vector.z)
    }

    fn update_matrix(&mut self) {
        let p = self.pos_vector;
        let s = self.scale;

        self.matrix = match self.kind {
            ObjectKind::Model | ObjectKind::Light | ObjectKind::Primitive => {
                matrix::translation(p.x, p.y, p.z) * self.rotation_matrix() * matrix::scaling(s.x, s.y, s.z)
            }
            ObjectKind::Sprite { width, height } => {
                matrix::translation(p.x, p.y, p.z)
                    * self.rotation_matrix()
                    * matrix::scaling(width * s.x, height * s.y, 1.0)
            }
            ObjectKind::Camera3D => {
                let rotation = self.rotation_matrix();
                let target = p + matrix::transform_normal(&rotation, &DEFAULT_FORWARD);
                let up = matrix::transform_normal(&rotation, &DEFAULT_UP);
                matrix::look_at_lh(&p, &target, &up)
            }
            ObjectKind::Camera2D => matrix::translation(-p.x, -p.y, -p.z) * self.rotation_matrix(),
        };

        self.directions = Directions::from_rotation(self.rot_vector.x, self.rot_vector.y);
    }
}
