//! 简单的碰撞检测

use super::game_object::SceneObject;

/// 两个对象的距离是否小于 `radius`
pub fn check_sphere(a: &SceneObject, b: &SceneObject, radius: f32) -> bool {
    (a.position() - b.position()).norm() < radius
}

/// `a` 是否位于以 `b` 为底面中心、半径 `radius`、高 `height` 的竖直圆柱内
pub fn check_cylinder(a: &SceneObject, b: &SceneObject, radius: f32, height: f32) -> bool {
    let d = a.position() - b.position();
    let horizontal = (d.x * d.x + d.z * d.z).sqrt();
    horizontal < radius && d.y >= 0.0 && d.y <= height
}
