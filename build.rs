/// Build script for dx11_framework
///
/// # Shader Compilation Strategy:
/// - D3D11: HLSL shaders under res/shaders are compiled at runtime via D3DCompile
/// - Headless: sources are validated for the VS/PS entry points at initialization
fn main() {
    // Trigger rebuild if shader files change
    println!("cargo:rerun-if-changed=res/shaders/Model.fx");
    println!("cargo:rerun-if-changed=res/shaders/Model_NoLight.fx");
    println!("cargo:rerun-if-changed=res/shaders/Model_Instanced.fx");
    println!("cargo:rerun-if-changed=res/shaders/Outline.fx");
    println!("cargo:rerun-if-changed=res/shaders/Sprite.fx");
    println!("cargo:rerun-if-changed=res/shaders/Sprite_Discard.fx");
    println!("cargo:rerun-if-changed=res/shaders/Fullscreen.fx");
}
