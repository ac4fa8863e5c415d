//! 图形后端模块
//!
//! 本模块提供 `RenderDevice` 的具体实现：
//! - headless：记录所有调用的参考设备，任何平台可用
//! - Direct3D 11：Windows 平台的实际 GPU 实现
//!
//! `renderer::Graphics` 只依赖 `RenderDevice` trait，
//! 两个后端可以在启动时按配置切换。

pub mod headless;
#[cfg(target_os = "windows")]
pub mod d3d11;

pub use headless::HeadlessDevice;
#[cfg(target_os = "windows")]
pub use d3d11::D3d11Device;

#[cfg(test)]
mod tests {
    /// 窗口句柄只在 Direct3D 11 后端使用，依赖只在 Windows 上引入
    #[test]
    fn test_window_handle_crate_is_windows_only() {
        let manifest: toml::Table = toml::from_str(include_str!("../../Cargo.toml")).unwrap();
        let common = manifest["dependencies"].as_table().unwrap();
        assert!(!common.contains_key("raw-window-handle"));

        let windows = manifest["target"]["cfg(target_os = \"windows\")"]["dependencies"].as_table().unwrap();
        assert!(windows.contains_key("raw-window-handle"));
        assert!(windows.contains_key("windows"));
    }
}
