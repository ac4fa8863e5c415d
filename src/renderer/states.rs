//! 渲染状态注册表
//!
//! 初始化时一次性创建的不可变状态对象（光栅化、深度模板、采样器、混合）和视口，
//! 按枚举键存放在定长表中。表由键的全部取值按顺序构建，因此查找不会失败。
//!
//! 每帧的状态选择由 `select_bindings` 这个纯函数完成：它读取视图和场景标志，
//! 对每一类状态恰好给出一个结果。

use std::marker::PhantomData;

use tracing::debug;

use crate::core::error::Result;
use super::device::{
    BlendDesc, ComparisonFunc, CullMode, DepthStencilDesc, RasterizerDesc, RenderDevice,
    SamplerDesc, SamplerFilter, StateHandle, StencilOp, Viewport,
};
use super::params::{SceneParams, ViewportParams};

/// 状态表的键：取值有限且连续编号
pub trait StateKey: Copy + Eq + 'static {
    /// 全部取值，`ALL[i].index() == i`
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn name(self) -> &'static str;
}

macro_rules! state_key {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl StateKey for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn index(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

state_key! {
    /// 视口
    pub enum ViewportSide {
        Full => "Full",
        /// 分屏左半边
        Left => "Left",
        /// 分屏右半边
        Right => "Right",
    }
}

state_key! {
    /// 模板测试配置
    pub enum StencilMode {
        /// 关闭模板测试
        Off => "Off",
        /// 只在模板值不等于 1 的像素绘制，并写入 1
        Mask => "Mask",
        /// 总是通过并写入 1
        Write => "Write",
    }
}

state_key! {
    /// 光栅化配置
    pub enum RasterizerMode {
        /// 实心，背面剔除
        Solid => "Solid",
        /// 实心，正面剔除（从内部观察天空盒）
        Cubemap => "Cubemap",
        /// 线框，不剔除
        Wireframe => "Wireframe",
    }
}

state_key! {
    /// 纹理采样方式
    pub enum SamplerKind {
        Anisotropic => "Anisotropic",
        Bilinear => "Bilinear",
        Point => "Point",
    }
}

state_key! {
    /// 3D 相机
    pub enum CameraId {
        /// 主相机（分屏左侧）
        Main => "Main",
        /// 点相机（分屏右侧）
        Point => "Point",
        /// 第三人称相机，跟随第 0 个模型
        Third => "Third",
    }
}

impl Default for SamplerKind {
    fn default() -> Self {
        SamplerKind::Anisotropic
    }
}

impl Default for CameraId {
    fn default() -> Self {
        CameraId::Main
    }
}

/// 以枚举为下标的定长表
#[derive(Debug, Clone)]
pub struct StateTable<K: StateKey, V> {
    entries: Vec<V>,
    _key: PhantomData<K>,
}

impl<K: StateKey, V> StateTable<K, V> {
    /// 为每个键构建一个值；任一失败则整个表构建失败
    pub fn try_build(mut build: impl FnMut(K) -> Result<V>) -> Result<Self> {
        let entries = K::ALL.iter().map(|&key| build(key)).collect::<Result<Vec<_>>>()?;
        Ok(Self { entries, _key: PhantomData })
    }

    pub fn build(mut build: impl FnMut(K) -> V) -> Self {
        Self {
            entries: K::ALL.iter().map(|&key| build(key)).collect(),
            _key: PhantomData,
        }
    }

    pub fn get(&self, key: K) -> &V {
        &self.entries[key.index()]
    }

    pub fn get_mut(&mut self, key: K) -> &mut V {
        &mut self.entries[key.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        K::ALL.iter().copied().zip(self.entries.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        K::ALL.iter().copied().zip(self.entries.iter_mut())
    }
}

impl ViewportSide {
    /// 窗口尺寸下的视口矩形
    pub fn viewport(self, width: u32, height: u32) -> Viewport {
        let (w, h) = (width as f32, height as f32);
        match self {
            ViewportSide::Full => Viewport::new(0.0, 0.0, w, h),
            ViewportSide::Left => Viewport::new(0.0, 0.0, w / 2.0, h),
            ViewportSide::Right => Viewport::new(w / 2.0, 0.0, w / 2.0, h),
        }
    }
}

impl StencilMode {
    pub fn desc(self) -> DepthStencilDesc {
        let base = DepthStencilDesc {
            depth_enable: true,
            depth_func: ComparisonFunc::LessEqual,
            stencil_enable: false,
            stencil_func: ComparisonFunc::Always,
            stencil_pass_op: StencilOp::Keep,
            stencil_ref: 0,
        };

        match self {
            StencilMode::Off => base,
            StencilMode::Mask => DepthStencilDesc {
                stencil_enable: true,
                stencil_func: ComparisonFunc::NotEqual,
                stencil_pass_op: StencilOp::Replace,
                stencil_ref: 1,
                ..base
            },
            StencilMode::Write => DepthStencilDesc {
                stencil_enable: true,
                stencil_func: ComparisonFunc::Always,
                stencil_pass_op: StencilOp::Replace,
                stencil_ref: 1,
                ..base
            },
        }
    }
}

impl RasterizerMode {
    pub fn desc(self) -> RasterizerDesc {
        match self {
            RasterizerMode::Solid => RasterizerDesc { solid: true, cull: CullMode::Back },
            RasterizerMode::Cubemap => RasterizerDesc { solid: true, cull: CullMode::Front },
            RasterizerMode::Wireframe => RasterizerDesc { solid: false, cull: CullMode::None },
        }
    }

    /// 场景的实心/线框开关
    pub fn from_solid(solid: bool) -> Self {
        if solid {
            RasterizerMode::Solid
        } else {
            RasterizerMode::Wireframe
        }
    }
}

impl SamplerKind {
    pub fn desc(self) -> SamplerDesc {
        match self {
            SamplerKind::Anisotropic => SamplerDesc { filter: SamplerFilter::Anisotropic, max_anisotropy: 16 },
            SamplerKind::Bilinear => SamplerDesc { filter: SamplerFilter::Linear, max_anisotropy: 1 },
            SamplerKind::Point => SamplerDesc { filter: SamplerFilter::Point, max_anisotropy: 1 },
        }
    }
}

/// 深度模板状态对象及其参考值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub state: StateHandle,
    pub stencil_ref: u32,
}

/// 初始化时创建的全部状态对象
#[derive(Debug)]
pub struct RenderStates {
    pub rasterizers: StateTable<RasterizerMode, StateHandle>,
    pub stencils: StateTable<StencilMode, StencilState>,
    pub samplers: StateTable<SamplerKind, StateHandle>,
    pub viewports: StateTable<ViewportSide, Viewport>,
    pub blend: StateHandle,
}

impl RenderStates {
    /// 创建全部状态对象；任一失败即初始化失败
    pub fn new<D: RenderDevice + ?Sized>(device: &mut D, width: u32, height: u32) -> Result<Self> {
        let rasterizers = StateTable::try_build(|mode: RasterizerMode| device.create_rasterizer_state(&mode.desc()))?;
        let stencils = StateTable::try_build(|mode: StencilMode| {
            let desc = mode.desc();
            let state = device.create_depth_stencil_state(&desc)?;
            Ok(StencilState { state, stencil_ref: desc.stencil_ref })
        })?;
        let samplers = StateTable::try_build(|kind: SamplerKind| device.create_sampler_state(&kind.desc()))?;
        let viewports = StateTable::build(|side: ViewportSide| side.viewport(width, height));
        let blend = device.create_blend_state(&BlendDesc { alpha_blend: true })?;

        debug!(
            rasterizers = RasterizerMode::ALL.len(),
            stencils = StencilMode::ALL.len(),
            samplers = SamplerKind::ALL.len(),
            viewports = ViewportSide::ALL.len(),
            "Render states created"
        );

        Ok(Self { rasterizers, stencils, samplers, viewports, blend })
    }

    pub fn bind_rasterizer<D: RenderDevice + ?Sized>(&self, device: &mut D, mode: RasterizerMode) {
        device.set_rasterizer_state(*self.rasterizers.get(mode));
    }

    pub fn bind_stencil<D: RenderDevice + ?Sized>(&self, device: &mut D, mode: StencilMode) {
        let stencil = self.stencils.get(mode);
        device.set_depth_stencil_state(stencil.state, stencil.stencil_ref);
    }

    pub fn bind_sampler<D: RenderDevice + ?Sized>(&self, device: &mut D, kind: SamplerKind) {
        device.set_sampler(0, *self.samplers.get(kind));
    }

    pub fn bind_viewport<D: RenderDevice + ?Sized>(&self, device: &mut D, side: ViewportSide) {
        device.set_viewport(self.viewports.get(side));
    }

    pub fn bind_blend<D: RenderDevice + ?Sized>(&self, device: &mut D) {
        device.set_blend_state(self.blend);
    }
}

/// 一帧开始时选定的绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBindings {
    pub viewport: ViewportSide,
    pub camera: CameraId,
    pub rasterizer: RasterizerMode,
    pub sampler: SamplerKind,
    /// 是否清除离屏目标和深度模板
    pub clear_offscreen: bool,
}

/// 由标志选出本帧的绑定
///
/// - `use_left` / `use_right` 是一次性请求，在这里被消费；两者同时存在时先处理左侧，
///   右侧请求留到下一次调用
/// - 左侧：Left 视口，Main 相机；右侧：Right 视口，Point 相机
/// - 否则绑定 Full 视口；全屏且分屏时相机由 `control_left_side` 决定，其余情况保持当前相机
pub fn select_bindings(
    viewport: &mut ViewportParams,
    scene: &SceneParams,
    current_camera: CameraId,
) -> FrameBindings {
    let clear_offscreen = (viewport.use_left && viewport.use_split)
        || (viewport.use_full && !viewport.use_split)
        || (scene.multi_view && !viewport.use_split);

    let (side, camera) = if viewport.use_left {
        viewport.use_left = false;
        (ViewportSide::Left, CameraId::Main)
    } else if viewport.use_right {
        viewport.use_right = false;
        (ViewportSide::Right, CameraId::Point)
    } else if viewport.use_full && viewport.use_split {
        let camera = if viewport.control_left_side { CameraId::Main } else { CameraId::Point };
        (ViewportSide::Full, camera)
    } else {
        (ViewportSide::Full, current_camera)
    };

    FrameBindings {
        viewport: side,
        camera,
        rasterizer: RasterizerMode::from_solid(scene.rasterizer_solid),
        sampler: scene.sampler,
        clear_offscreen,
    }
}
