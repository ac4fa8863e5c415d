//! 点光源
//!
//! 光源本身也是一个可绘制的场景对象（灯模型）。它可以被主相机“拾取”并携带，
//! 放下后落回静止高度；闪烁开启时光照强度随时间起伏。

use std::ops::{Deref, DerefMut};

use super::camera::Camera3D;
use super::game_object::{ObjectKind, SceneObject};
use crate::core::scene::LightConfig;
use crate::renderer::constants::CbPsLight;

/// 光源放下后停留的高度
pub const LIGHT_REST_HEIGHT: f32 = 5.25;
/// 被携带时与相机的距离
const CARRY_DISTANCE: f32 = 3.0;
/// 被携带时低于相机的距离
const CARRY_DROP: f32 = 1.0;
/// 下落速度（单位 / 毫秒）
const FALL_SPEED: f32 = 0.01;
/// 闪烁相位速度（弧度 / 毫秒）
const FLICKER_SPEED: f32 = 0.02;

/// 点光源
#[derive(Debug, Clone)]
pub struct Light {
    object: SceneObject,

    pub ambient_color: [f32; 3],
    pub ambient_strength: f32,
    pub light_color: [f32; 3],
    pub light_strength: f32,
    pub specular_color: [f32; 3],
    pub specular_intensity: f32,
    pub specular_power: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// 点光源开关（同时控制天空盒）
    pub use_point_light: bool,

    flicker_phase: f32,
    /// 闪烁调制后的强度系数
    flicker_factor: f32,
}

impl Light {
    pub fn new(config: &LightConfig) -> Self {
        Self {
            object: SceneObject::new("Light", ObjectKind::Light),
            ambient_color: config.ambient_color,
            ambient_strength: config.ambient_strength,
            light_color: config.light_color,
            light_strength: config.light_strength,
            specular_color: [1.0, 1.0, 1.0],
            specular_intensity: 1.0,
            specular_power: 10.0,
            constant: 1.0,
            linear: 0.045,
            quadratic: 0.0075,
            use_point_light: config.use_point_light,
            flicker_phase: 0.0,
            flicker_factor: 1.0,
        }
    }

    /// 把光源参数写入常量缓冲区数据（不上传）
    pub fn update_constant_buffer(&self, data: &mut CbPsLight) {
        data.ambient_color = self.ambient_color;
        data.ambient_strength = self.ambient_strength;
        data.light_color = self.light_color;
        data.light_strength = self.light_strength * self.flicker_factor;
        data.specular_color = self.specular_color;
        data.specular_intensity = self.specular_intensity;
        data.specular_power = self.specular_power;
        data.light_position = self.object.position_array();
        data.constant = self.constant;
        data.linear = self.linear;
        data.quadratic = self.quadratic;
        data.use_point_light = self.use_point_light as u32;
    }

    /// 被携带时跟随相机，否则落回静止高度
    pub fn update_physics(&mut self, carrier: &Camera3D, stuck: bool, dt: f32) {
        if stuck {
            let position = carrier.position() + carrier.forward(true) * CARRY_DISTANCE;
            self.object.set_position_xyz(position.x, position.y - CARRY_DROP, position.z);
            self.object.set_rotation(carrier.rotation());
        } else {
            let p = self.object.position();
            if p.y > LIGHT_REST_HEIGHT {
                let y = (p.y - FALL_SPEED * dt).max(LIGHT_REST_HEIGHT);
                self.object.set_position_xyz(p.x, y, p.z);
            } else if p.y < LIGHT_REST_HEIGHT {
                self.object.set_position_xyz(p.x, LIGHT_REST_HEIGHT, p.z);
            }
        }
    }

    /// 推进闪烁相位；`amount` 为 0..1 的强度起伏幅度
    pub fn update_flicker(&mut self, enabled: bool, amount: f32, dt: f32) {
        if !enabled {
            self.flicker_factor = 1.0;
            return;
        }

        self.flicker_phase = (self.flicker_phase + FLICKER_SPEED * dt) % std::f32::consts::TAU;
        let wave = 0.5 + 0.5 * self.flicker_phase.sin();
        self.flicker_factor = 1.0 - amount.clamp(0.0, 1.0) * wave;
    }

    pub fn flicker_factor(&self) -> f32 {
        self.flicker_factor
    }
}

impl Deref for Light {
    type Target = SceneObject;

    fn deref(&self) -> &SceneObject {
        &self.object
    }
}

impl DerefMut for Light {
    fn deref_mut(&mut self) -> &mut SceneObject {
        &mut self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use bytemuck::Zeroable;

    #[test]
    fn test_constant_buffer_defaults() {
        let light = Light::new(&LightConfig::default());
        let mut data = CbPsLight::zeroed();
        light.update_constant_buffer(&mut data);

        assert_eq!(data.ambient_strength, 0.1);
        assert_eq!(data.light_strength, 1.0);
        assert_eq!(data.specular_power, 10.0);
        assert_eq!((data.constant, data.linear, data.quadratic), (1.0, 0.045, 0.0075));
        assert_eq!(data.use_point_light, 1);
    }

    #[test]
    fn test_dropped_light_falls_to_rest_height() {
        let mut light = Light::new(&LightConfig::default());
        light.set_position_xyz(0.0, 8.0, 0.0);
        let camera = Camera3D::new("Main", Vector3::new(0.0, 9.0, -20.0));

        light.update_physics(&camera, false, 100.0);
        assert!(light.position().y < 8.0);
        for _ in 0..100 {
            light.update_physics(&camera, false, 100.0);
        }
        assert_eq!(light.position().y, LIGHT_REST_HEIGHT);
    }

    #[test]
    fn test_carried_light_follows_camera() {
        let mut light = Light::new(&LightConfig::default());
        let camera = Camera3D::new("Main", Vector3::new(0.0, 9.0, -20.0));

        light.update_physics(&camera, true, 16.0);
        let p = light.position();
        assert!((p - Vector3::new(0.0, 8.0, -17.0)).norm() < 1e-5);
    }

    #[test]
    fn test_flicker_dims_light() {
        let mut light = Light::new(&LightConfig::default());
        light.update_flicker(true, 0.5, 50.0);
        assert!(light.flicker_factor() < 1.0 && light.flicker_factor() >= 0.5);

        light.update_flicker(false, 0.5, 50.0);
        assert_eq!(light.flicker_factor(), 1.0);
    }
}
