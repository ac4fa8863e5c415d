//! 公告板：让模型绕 Y 轴转向相机

use super::game_object::SceneObject;

/// 让 `object` 转向 `camera` 所需的 yaw（弧度）
pub fn billboard_yaw(camera: &SceneObject, object: &SceneObject) -> f32 {
    let d = object.position() - camera.position();
    d.x.atan2(d.z)
}
