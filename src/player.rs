use anyhow::{Context, Result, anyhow};
use std::process::Command;

use animexin::{ExtractorLink, SubtitleFile};
use animexin::utils::is_program_installed;

/// Command-line arguments for opening `link` in `player`.
pub fn player_args(player: &str, link: &ExtractorLink, subtitles: &[SubtitleFile]) -> Result<Vec<String>> {
    let mut args = Vec::new();

    match player {
        "mpv" => {
            if !link.referer.is_empty() {
                args.push(format!("--referrer={}", link.referer));
            }
            args.push(format!("--force-media-title={}", link.name));
            for subtitle in subtitles {
                args.push(format!("--sub-file={}", subtitle.url));
            }
        }
        "vlc" => {
            if !link.referer.is_empty() {
                args.push(format!("--http-referrer={}", link.referer));
            }
            args.push(format!("--meta-title={}", link.name));
            if let Some(subtitle) = subtitles.first() {
                args.push(format!("--input-slave={}", subtitle.url));
            }
        }
        other => return Err(anyhow!("unsupported player '{}' (use mpv or vlc)", other)),
    }

    args.push(link.url.clone());
    Ok(args)
}

pub fn play(player: &str, link: &ExtractorLink, subtitles: &[SubtitleFile]) -> Result<()> {
    if !is_program_installed(player) {
        return Err(anyhow!("{} is not installed", player));
    }

    let args = player_args(player, link, subtitles)?;
    tracing::info!("opening {} ({}) in {}", link.name, link.quality, player);

    let status = Command::new(player)
        .args(&args)
        .status()
        .with_context(|| format!("failed to start {}", player))?;

    if !status.success() {
        return Err(anyhow!("{} exited with {}", player, status));
    }
    Ok(())
}
