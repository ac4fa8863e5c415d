//! 相机
//!
//! `Camera3D` 和 `Camera2D` 包装一个 `SceneObject`：对象的矩阵即视图矩阵，
//! 投影矩阵在 `set_projection_values` 时计算一次并缓存。

use std::ops::{Deref, DerefMut};

use super::game_object::{ObjectKind, SceneObject};
use crate::math::{matrix, utils, Matrix4, Vector3};

/// 第三人称相机与目标的水平距离
const THIRD_PERSON_DISTANCE: f32 = 20.0;
/// 第三人称相机高于目标的距离
const THIRD_PERSON_HEIGHT: f32 = 10.0;
/// 第三人称相机注视点高于目标原点的距离
const THIRD_PERSON_FOCUS_HEIGHT: f32 = 5.0;

/// 透视相机
#[derive(Debug, Clone)]
pub struct Camera3D {
    object: SceneObject,
    projection: Matrix4,
    fov_degrees: f32,
    aspect: f32,
    near_z: f32,
    far_z: f32,
}

impl Camera3D {
    pub fn new(name: impl Into<String>, position: Vector3) -> Self {
        let mut object = SceneObject::new(name, ObjectKind::Camera3D);
        object.set_position(position);

        Self {
            object,
            projection: Matrix4::identity(),
            fov_degrees: 0.0,
            aspect: 0.0,
            near_z: 0.0,
            far_z: 0.0,
        }
    }

    /// 设置透视投影参数
    ///
    /// # 参数
    /// - `fov_degrees`: 垂直视场角（度数）
    /// - `aspect`: 宽高比
    /// - `near_z`: 近裁剪面距离
    /// - `far_z`: 远裁剪面距离
    pub fn set_projection_values(&mut self, fov_degrees: f32, aspect: f32, near_z: f32, far_z: f32) {
        self.fov_degrees = fov_degrees;
        self.aspect = aspect;
        self.near_z = near_z;
        self.far_z = far_z;
        self.projection = matrix::perspective_fov_lh(utils::deg_to_rad(fov_degrees), aspect, near_z, far_z);
    }

    pub fn view_matrix(&self) -> &Matrix4 {
        self.object.matrix()
    }

    pub fn projection_matrix(&self) -> &Matrix4 {
        &self.projection
    }

    pub fn view_projection(&self) -> Matrix4 {
        self.projection * self.object.matrix()
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near_z(&self) -> f32 {
        self.near_z
    }

    pub fn far_z(&self) -> f32 {
        self.far_z
    }

    /// 跟随目标：停在目标背后上方并注视目标
    pub fn update_third_person(&mut self, target: &SceneObject) {
        let behind = target.backward(true) * THIRD_PERSON_DISTANCE;
        let position = target.position() + behind + Vector3::new(0.0, THIRD_PERSON_HEIGHT, 0.0);
        self.object.set_position(position);
        self.object
            .set_look_at_pos(target.position() + Vector3::new(0.0, THIRD_PERSON_FOCUS_HEIGHT, 0.0));
    }
}

impl Deref for Camera3D {
    type Target = SceneObject;

    fn deref(&self) -> &SceneObject {
        &self.object
    }
}

impl DerefMut for Camera3D {
    fn deref_mut(&mut self) -> &mut SceneObject {
        &mut self.object
    }
}

/// 正交相机，用于精灵和菜单
#[derive(Debug, Clone)]
pub struct Camera2D {
    object: SceneObject,
    ortho: Matrix4,
    world_ortho: Matrix4,
}

impl Camera2D {
    pub fn new() -> Self {
        Self {
            object: SceneObject::new("Camera2D", ObjectKind::Camera2D),
            ortho: Matrix4::identity(),
            world_ortho: Matrix4::identity(),
        }
    }

    /// 像素空间正交投影：原点在左上角，y 轴向下
    pub fn set_projection_values(&mut self, width: f32, height: f32, near_z: f32, far_z: f32) {
        self.ortho = matrix::orthographic_off_center_lh(0.0, width, height, 0.0, near_z, far_z);
        self.world_ortho = self.ortho * self.object.matrix();
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.object.set_position(position);
        self.world_ortho = self.ortho * self.object.matrix();
    }

    pub fn position(&self) -> Vector3 {
        self.object.position()
    }

    pub fn ortho_matrix(&self) -> &Matrix4 {
        &self.ortho
    }

    /// 视图矩阵与正交投影的乘积
    pub fn world_ortho_matrix(&self) -> &Matrix4 {
        &self.world_ortho
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new()
    }
}
