//! Loading of external files (texture images) and generation of the
//! primitive meshes the scene is built from.

use std::path::Path;

pub mod mesh;
pub mod texture;

#[cfg(target_arch = "wasm32")]
fn format_url(asset_dir: &Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("window location has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, asset_dir.display()))?;
    Ok(base.join(file_name)?)
}

/// Read the raw bytes of `file_name`, relative to `asset_dir`.
///
/// Natively this is a plain file read; in the browser the asset directory is
/// resolved against the page origin and fetched over HTTP.
pub async fn load_binary(asset_dir: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(asset_dir, file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_dir.join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}
