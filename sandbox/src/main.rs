// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loads the bundles of a manifest from a directory and reports what landed
//! in the cache.
//!
//! ```text
//! sandbox --root assets --manifest assets/manifest.json --bundle ui --bundle level-1
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use kiln_agents::asset_agent::{AssetAgent, AssetInitOptions};
use kiln_core::{
    asset::{AssetValue, Spritesheet, Texture},
    manifest::AssetsManifest,
};
use kiln_infra::fetch::FileFetcher;
use std::{io::Write, path::PathBuf, sync::Arc};

#[derive(Parser, Debug)]
#[command(version, about)]
struct CliArgs {
    /// Directory every asset source is relative to.
    #[arg(long)]
    root: PathBuf,

    /// Manifest file, relative to the working directory.
    #[arg(long)]
    manifest: PathBuf,

    /// Bundles to load. Every bundle of the manifest when omitted.
    #[arg(long = "bundle")]
    bundles: Vec<String>,

    /// Prefer textures of this density, then fall back to 1x.
    #[arg(long, default_value_t = 1.0)]
    resolution: f64,
}

fn describe(value: &AssetValue) -> String {
    if let Some(texture) = value.downcast_ref::<Texture>() {
        format!(
            "texture {}x{} @{}x",
            texture.width, texture.height, texture.resolution
        )
    } else if let Some(sheet) = value.downcast_ref::<Spritesheet>() {
        format!(
            "spritesheet, {} frame(s), {} linked",
            sheet.frames.len(),
            sheet.linked_sheets.len()
        )
    } else {
        value.type_name().to_string()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = CliArgs::parse();

    let bytes = std::fs::read(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let manifest = AssetsManifest::from_json(&bytes).context("Invalid manifest")?;

    let bundles = if args.bundles.is_empty() {
        manifest.bundles.iter().map(|bundle| bundle.name.clone()).collect()
    } else {
        args.bundles.clone()
    };

    let agent = AssetAgent::new(Arc::new(FileFetcher::new(&args.root)));
    let mut options = AssetInitOptions {
        manifest: Some(manifest),
        ..Default::default()
    };
    let preference = options.texture_preference.get_or_insert_with(Default::default);
    if args.resolution != 1.0 {
        preference.resolution.insert(0, args.resolution);
    }
    agent.init(options).await?;

    log::info!("Loading {} bundle(s) from {}", bundles.len(), args.root.display());
    let loaded = agent
        .load_bundle_with_progress(bundles, |progress| {
            print!("\rLoading... {:>3.0}%", progress * 100.0);
            let _ = std::io::stdout().flush();
        })
        .await?
        .many()
        .unwrap_or_default();
    println!();

    for (bundle, members) in &loaded {
        println!("[{bundle}]");
        for (alias, value) in members {
            match value {
                Some(value) => println!("  {alias}: {}", describe(value)),
                None => println!("  {alias}: no parser"),
            }
        }
    }
    println!("{} cache entries", agent.cache().len());

    Ok(())
}
