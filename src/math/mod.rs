//! 统一的数学库模块
//!
//! 提供渲染框架常用的数学类型和函数，基于 `nalgebra`。
//!
//! # 约定
//!
//! 所有矩阵辅助函数遵循 DirectXMath 的左手坐标系约定（+Z 为前方），
//! 但以列向量形式存储：`v' = M * v`。上传到 GPU 时按列主序写入，
//! HLSL 侧使用 `mul(M, v)`。
//!
//! - **基础类型**：Vector2/3/4, Matrix4, Color
//! - **常量**：PI, DEG_TO_RAD 等
//! - **工具函数**：clamp, lerp 等
//! - **矩阵辅助函数**：平移、缩放、roll-pitch-yaw 旋转、左手投影/视图矩阵

pub use nalgebra::{
    Matrix4 as Mat4, Point3,
    Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// 颜色类型（RGBA，范围 0.0-1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// 创建新的颜色
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 创建 RGB 颜色（alpha = 1.0）
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// 转换为 `[r, g, b, a]` 数组（清屏颜色）
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
}

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// π/2
    pub const HALF_PI: f32 = std::f32::consts::FRAC_PI_2;

    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 数学工具函数
pub mod utils {
    use super::*;

    /// 限制值在范围内
    pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// 线性插值
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// 角度转弧度
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// 检查两个浮点数是否近似相等
    pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }
}

/// 矩阵辅助函数（DirectXMath 语义）
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// 创建缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 创建绕 X 轴旋转的矩阵
    pub fn rotation_x(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::x_axis(), angle)
    }

    /// 创建绕 Y 轴旋转的矩阵
    pub fn rotation_y(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::y_axis(), angle)
    }

    /// 创建绕 Z 轴旋转的矩阵
    pub fn rotation_z(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::z_axis(), angle)
    }

    /// 与 `XMMatrixRotationRollPitchYaw` 等价的旋转：先 roll（Z），再 pitch（X），最后 yaw（Y）
    pub fn rotation_roll_pitch_yaw(pitch: f32, yaw: f32, roll: f32) -> Matrix4 {
        rotation_y(yaw) * rotation_x(pitch) * rotation_z(roll)
    }

    /// 用旋转矩阵变换方向向量（忽略平移）
    pub fn transform_normal(m: &Matrix4, v: &Vector3) -> Vector3 {
        m.transform_vector(v)
    }

    /// 左手透视投影（深度范围 0..1）
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        let h = 1.0 / (fov_y * 0.5).tan();
        let w = h / aspect;
        let range = far / (far - near);

        #[rustfmt::skip]
        let m = Matrix4::new(
            w, 0.0, 0.0, 0.0,
            0.0, h, 0.0, 0.0,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 1.0, 0.0,
        );
        m
    }

    /// 左手正交投影（深度范围 0..1）
    pub fn orthographic_off_center_lh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4 {
        let rw = 1.0 / (right - left);
        let rh = 1.0 / (top - bottom);
        let range = 1.0 / (far - near);

        #[rustfmt::skip]
        let m = Matrix4::new(
            2.0 * rw, 0.0, 0.0, -(left + right) * rw,
            0.0, 2.0 * rh, 0.0, -(top + bottom) * rh,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }

    /// 左手 Look-At 视图矩阵
    pub fn look_at_lh(eye: &Vector3, target: &Vector3, up: &Vector3) -> Matrix4 {
        let z = (target - eye).normalize();
        let x = up.cross(&z).normalize();
        let y = z.cross(&x);

        #[rustfmt::skip]
        let view = Matrix4::new(
            x.x, x.y, x.z, -x.dot(eye),
            y.x, y.y, y.z, -y.dot(eye),
            z.x, z.y, z.z, -z.dot(eye),
            0.0, 0.0, 0.0, 1.0,
        );
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_vec(a: &Vector3, b: &Vector3) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn test_matrix_translation() {
        let mat = matrix::translation(1.0, 2.0, 3.0);
        let point = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let result = mat * point;

        assert!((result.x - 1.0).abs() < 1e-6);
        assert!((result.y - 2.0).abs() < 1e-6);
        assert!((result.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_turns_forward_towards_positive_x() {
        let rot = matrix::rotation_roll_pitch_yaw(0.0, constants::HALF_PI, 0.0);
        let forward = matrix::transform_normal(&rot, &Vector3::new(0.0, 0.0, 1.0));
        assert!(approx_vec(&forward, &Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_positive_pitch_looks_down() {
        let rot = matrix::rotation_roll_pitch_yaw(constants::HALF_PI, 0.0, 0.0);
        let forward = matrix::transform_normal(&rot, &Vector3::new(0.0, 0.0, 1.0));
        assert!(approx_vec(&forward, &Vector3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn test_perspective_maps_near_and_far_to_unit_depth() {
        let proj = matrix::perspective_fov_lh(utils::deg_to_rad(70.0), 16.0 / 9.0, 0.1, 1000.0);

        let near = proj * Vector4::new(0.0, 0.0, 0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, 1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_look_at_moves_target_onto_positive_z() {
        let eye = Vector3::new(0.0, 9.0, -20.0);
        let target = Vector3::new(0.0, 9.0, 0.0);
        let view = matrix::look_at_lh(&eye, &target, &Vector3::y());

        let t = view * Vector4::new(target.x, target.y, target.z, 1.0);
        assert!(approx_vec(&t.xyz(), &Vector3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn test_orthographic_maps_screen_corners() {
        let ortho = matrix::orthographic_off_center_lh(0.0, 800.0, 600.0, 0.0, 0.0, 1.0);
        let top_left = ortho * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = ortho * Vector4::new(800.0, 600.0, 0.0, 1.0);
        assert!(approx_vec(&top_left.xyz(), &Vector3::new(-1.0, 1.0, 0.0)));
        assert!(approx_vec(&bottom_right.xyz(), &Vector3::new(1.0, -1.0, 0.0)));
    }
}
