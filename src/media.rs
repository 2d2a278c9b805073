//! On-disk media storage and placeholder image rendering.
//!
//! Uploaded answer media (and rendered question illustrations) live under an
//! uploads root with one subdirectory per kind: `audio/` and `images/`.
//! Callers hold opaque relative references like `images/20260401_113000_ab12….svg`
//! and resolve them back through the store when a collaborator needs the file.

use std::path::PathBuf;

use base64::Engine;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Level, Skill};
use crate::util::wrap_text;

const ALLOWED_IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg"];
const ALLOWED_AUDIO_EXTS: &[&str] = &["mp3", "wav", "ogg"];

/// Which subdirectory a file belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoredKind {
  Audio,
  Image,
}

impl StoredKind {
  fn subdir(&self) -> &'static str {
    match self {
      StoredKind::Audio => "audio",
      StoredKind::Image => "images",
    }
  }

  fn default_ext(&self) -> &'static str {
    match self {
      StoredKind::Audio => "wav",
      StoredKind::Image => "png",
    }
  }

  fn allowed(&self) -> &'static [&'static str] {
    match self {
      StoredKind::Audio => ALLOWED_AUDIO_EXTS,
      StoredKind::Image => ALLOWED_IMAGE_EXTS,
    }
  }
}

#[derive(Clone)]
pub struct MediaStore {
  root: PathBuf,
}

impl MediaStore {
  /// Open the store, creating the uploads root and its subdirectories.
  pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
    let root = root.into();
    for kind in [StoredKind::Audio, StoredKind::Image] {
      std::fs::create_dir_all(root.join(kind.subdir()))?;
    }
    Ok(Self { root })
  }

  /// Persist raw bytes, returning the opaque relative reference.
  /// Unrecognized extensions are replaced with the kind's default.
  #[instrument(level = "debug", skip(self, bytes), fields(bytes = bytes.len(), ?kind))]
  pub async fn save(
    &self,
    kind: StoredKind,
    bytes: &[u8],
    ext: Option<&str>,
  ) -> std::io::Result<String> {
    let ext = normalize_ext(kind, ext);
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let name = format!("{stamp}_{}.{ext}", Uuid::new_v4().simple());
    let reference = format!("{}/{name}", kind.subdir());
    tokio::fs::write(self.root.join(&reference), bytes).await?;
    info!(target: "assessment", %reference, "Stored media upload");
    Ok(reference)
  }

  /// Decode a base64 upload payload (standard alphabet, padded).
  pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(data.trim())
  }

  /// Absolute path for a previously returned reference.
  pub fn resolve(&self, reference: &str) -> PathBuf {
    self.root.join(reference)
  }

  /// Render the stand-in illustration for an image question: a deterministic
  /// SVG with the question's image description wrapped into lines. Returns
  /// the stored reference.
  #[instrument(level = "debug", skip(self, description))]
  pub async fn render_placeholder_image(
    &self,
    description: &str,
    skill: Skill,
    level: Level,
  ) -> std::io::Result<String> {
    let svg = placeholder_svg(description, skill, level);
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let name = format!("question_{stamp}_{}.svg", Uuid::new_v4().simple());
    let reference = format!("images/{name}");
    tokio::fs::write(self.root.join(&reference), svg).await?;
    info!(target: "assessment", %reference, "Rendered placeholder question image");
    Ok(reference)
  }
}

fn normalize_ext(kind: StoredKind, ext: Option<&str>) -> String {
  match ext {
    Some(e) => {
      let e = e.trim_start_matches('.').to_lowercase();
      if kind.allowed().contains(&e.as_str()) { e } else { kind.default_ext().to_string() }
    }
    None => kind.default_ext().to_string(),
  }
}

fn placeholder_svg(description: &str, skill: Skill, level: Level) -> String {
  let title = xml_escape(&format!("{} Question ({} Level)", skill.name(), level.name()));
  let mut body = String::new();
  let mut y = 120;
  for line in wrap_text(description, 60) {
    body.push_str(&format!(
      "  <text x=\"50\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"20\" fill=\"#000000\">{}</text>\n",
      xml_escape(&line)
    ));
    y += 30;
  }
  format!(
    "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800\" height=\"600\">\n\
     \x20 <rect x=\"0\" y=\"0\" width=\"800\" height=\"600\" fill=\"#f0f0f0\" stroke=\"#000000\" stroke-width=\"2\"/>\n\
     \x20 <text x=\"400\" y=\"60\" text-anchor=\"middle\" font-family=\"sans-serif\" font-size=\"30\" fill=\"#000000\">{title}</text>\n\
     {body}\
     \x20 <text x=\"50\" y=\"560\" font-family=\"sans-serif\" font-size=\"16\" fill=\"#646464\">This is a placeholder image. In a real app, this would be a relevant image.</text>\n\
     </svg>\n"
  )
}

fn xml_escape(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn save_and_resolve_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = MediaStore::open(dir.path()).unwrap();

    let reference = store.save(StoredKind::Audio, b"riff-bytes", Some("wav")).await.unwrap();
    assert!(reference.starts_with("audio/"));
    assert!(reference.ends_with(".wav"));
    assert_eq!(std::fs::read(store.resolve(&reference)).unwrap(), b"riff-bytes");
  }

  #[tokio::test]
  async fn unknown_extension_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = MediaStore::open(dir.path()).unwrap();

    let reference = store.save(StoredKind::Image, b"img", Some("exe")).await.unwrap();
    assert!(reference.ends_with(".png"));
    let reference = store.save(StoredKind::Audio, b"snd", None).await.unwrap();
    assert!(reference.ends_with(".wav"));
  }

  #[tokio::test]
  async fn placeholder_svg_carries_title_and_description() {
    let dir = tempfile::tempdir().unwrap();
    let store = MediaStore::open(dir.path()).unwrap();

    let reference = store
      .render_placeholder_image(
        "Two colleagues resolving a disagreement over a <project> plan",
        Skill::ConflictResolution,
        Level::Advanced,
      )
      .await
      .unwrap();
    assert!(reference.starts_with("images/question_"));
    assert!(reference.ends_with(".svg"));

    let svg = std::fs::read_to_string(store.resolve(&reference)).unwrap();
    assert!(svg.contains("Conflict Resolution Question (Advanced Level)"));
    assert!(svg.contains("&lt;project&gt;"));
    assert!(!svg.contains("<project>"));
  }

  #[test]
  fn base64_decode_rejects_garbage() {
    assert!(MediaStore::decode_base64("aGVsbG8=").is_ok());
    assert!(MediaStore::decode_base64("!!! not base64 !!!").is_err());
  }
}
