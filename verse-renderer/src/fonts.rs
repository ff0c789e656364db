//! Font registry: named fonts for measuring and rasterizing.
//!
//! Fonts live in a `fontdb` database that is shared with resvg, so a font
//! registered here is painted exactly like an installed one. Custom fonts are
//! registered under an alias (the name the user picked), replacing the family
//! names stored in the font file.
//!
//! Only TrueType/OpenType data (and collections) are accepted; WOFF and WOFF2
//! containers are rejected.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use base64::Engine;
use usvg::fontdb;
use verse_core::layout::{self, HeuristicMeasure, TextMeasure, DEFAULT_ASCENT_RATIO};
use verse_core::{FontRecord, Language};

use crate::error::{FontError, FontResult};

const SERIF_CANDIDATES: &[&str] = &[
    "Times New Roman",
    "Georgia",
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "FreeSerif",
];

const SANS_SERIF_CANDIDATES: &[&str] = &[
    "Arial",
    "Helvetica",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "FreeSans",
];

const MONOSPACE_CANDIDATES: &[&str] = &[
    "Courier New",
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "FreeMono",
];

/// Where font bytes come from.
#[derive(Debug, Clone)]
pub enum FontSource {
    /// Raw TTF/OTF bytes.
    Bytes(Vec<u8>),
    /// A `data:` URL.
    DataUrl(String),
    /// An `http(s)://`, `file://` or `data:` URL.
    Url(String),
    /// A font file on the local filesystem.
    Path(PathBuf),
}

impl FontSource {
    /// Resolve the source to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data cannot be fetched or decoded.
    pub async fn load(self) -> FontResult<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::DataUrl(data_url) => decode_data_url(&data_url),
            Self::Url(raw) => fetch_url(&raw).await,
            Self::Path(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

async fn fetch_url(raw: &str) -> FontResult<Vec<u8>> {
    let parsed = url::Url::parse(raw).map_err(|e| FontError::Fetch(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {
            tracing::debug!("Fetching font from {parsed}");
            let response = reqwest::get(parsed.clone())
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| FontError::Fetch(e.to_string()))?;
            let body = response
                .bytes()
                .await
                .map_err(|e| FontError::Fetch(e.to_string()))?;
            Ok(body.to_vec())
        }
        "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|()| FontError::Fetch(format!("Not a local path: {parsed}")))?;
            Ok(tokio::fs::read(path).await?)
        }
        "data" => decode_data_url(raw),
        other => Err(FontError::UnsupportedScheme(other.to_string())),
    }
}

/// Decode a `data:` URL (base64 or percent-encoded).
///
/// # Errors
///
/// Returns [`FontError::DataUrl`] if the URL is malformed.
pub fn decode_data_url(data_url: &str) -> FontResult<Vec<u8>> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| FontError::DataUrl("Not a data URL".to_string()))?;
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| FontError::DataUrl("Missing comma".to_string()))?;

    if metadata.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| FontError::DataUrl(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> FontResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .ok_or_else(|| FontError::DataUrl("Truncated percent escape".to_string()))?;
            let value = u8::from_str_radix(hex, 16)
                .map_err(|_| FontError::DataUrl(format!("Invalid percent escape %{hex}")))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Encode font bytes as a self-contained `data:` URL.
#[must_use]
pub fn encode_data_url(bytes: &[u8]) -> String {
    let mime = if bytes.starts_with(b"OTTO") {
        "font/otf"
    } else if bytes.starts_with(b"ttcf") {
        "font/collection"
    } else {
        "font/ttf"
    };
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Check that bytes hold a parsable TrueType/OpenType font.
///
/// # Errors
///
/// Returns [`FontError::InvalidData`] for anything else.
pub fn validate_font(bytes: &[u8]) -> FontResult<()> {
    if bytes.starts_with(b"wOFF") || bytes.starts_with(b"wOF2") {
        return Err(FontError::InvalidData(
            "WOFF/WOFF2 containers are not supported, use TTF or OTF".to_string(),
        ));
    }
    ttf_parser::Face::parse(bytes, 0)
        .map(|_| ())
        .map_err(|e| FontError::InvalidData(e.to_string()))
}

#[derive(Debug)]
struct CustomFont {
    name: String,
    data: Arc<Vec<u8>>,
    ids: Vec<fontdb::ID>,
}

#[derive(Debug)]
struct RegistryState {
    db: Arc<fontdb::Database>,
    custom: Vec<CustomFont>,
    /// Per-language family used when nothing in a family list resolves.
    fallbacks: Vec<(Language, Option<String>)>,
}

impl RegistryState {
    fn refresh_fallbacks(&mut self) {
        self.fallbacks = Language::ALL
            .iter()
            .map(|&language| (language, script_fallback(&self.db, language)))
            .collect();
    }

    fn fallback(&self, language: Language) -> Option<String> {
        self.fallbacks
            .iter()
            .find(|(l, _)| *l == language)
            .and_then(|(_, family)| family.clone())
    }
}

/// Named fonts available to layout and rasterization.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
#[derive(Debug)]
pub struct FontRegistry {
    state: RwLock<RegistryState>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// An empty registry. Text falls back to heuristic metrics until fonts
    /// are registered.
    #[must_use]
    pub fn new() -> Self {
        Self::from_database(fontdb::Database::new())
    }

    /// A registry seeded with the fonts installed on this system.
    #[must_use]
    pub fn with_system_fonts() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        configure_generic_families(&mut db);
        tracing::info!("Loaded {} system font face(s)", db.len());
        Self::from_database(db)
    }

    fn from_database(db: fontdb::Database) -> Self {
        let mut state = RegistryState {
            db: Arc::new(db),
            custom: Vec::new(),
            fallbacks: Vec::new(),
        };
        state.refresh_fallbacks();
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a font under `name`.
    ///
    /// Re-registering a name replaces the earlier font. On failure nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the source cannot be loaded or
    /// the data is not a usable font.
    pub async fn register(&self, name: &str, source: FontSource) -> FontResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FontError::EmptyName);
        }
        let bytes = source.load().await?;
        self.register_bytes(name, bytes)
    }

    /// Register raw font bytes under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the data is not a usable font.
    pub fn register_bytes(&self, name: &str, bytes: Vec<u8>) -> FontResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FontError::EmptyName);
        }
        validate_font(&bytes)?;

        let data = Arc::new(bytes);
        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = data.clone();

        let mut guard = self.write();
        let state = &mut *guard;
        let db = Arc::make_mut(&mut state.db);
        let loaded = db.load_font_source(fontdb::Source::Binary(shared));
        if loaded.is_empty() {
            return Err(FontError::InvalidData("No usable font faces".to_string()));
        }

        if let Some(index) = state.custom.iter().position(|f| f.name == name) {
            let previous = state.custom.remove(index);
            for id in previous.ids {
                db.remove_face(id);
            }
            tracing::debug!("Replacing font {name}");
        }

        let mut ids = Vec::with_capacity(loaded.len());
        for id in loaded {
            let Some(mut info) = db.face(id).cloned() else {
                continue;
            };
            db.remove_face(id);
            info.families = vec![(name.to_string(), fontdb::Language::English_UnitedStates)];
            ids.push(db.push_face_info(info));
        }

        tracing::info!("Registered font {name} ({} face(s))", ids.len());
        state.custom.push(CustomFont {
            name: name.to_string(),
            data,
            ids,
        });
        state.refresh_fallbacks();
        Ok(())
    }

    /// Whether `name` resolves to any font (custom or installed).
    #[must_use]
    pub fn is_available(&self, name: &str) -> bool {
        stored_family_name(&self.read().db, name).is_some()
    }

    /// Names of custom fonts in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.read().custom.iter().map(|f| f.name.clone()).collect()
    }

    /// Custom fonts as embeddable records.
    #[must_use]
    pub fn records(&self) -> Vec<FontRecord> {
        self.read()
            .custom
            .iter()
            .map(|f| FontRecord {
                name: f.name.clone(),
                data_url: encode_data_url(&f.data),
            })
            .collect()
    }

    /// Re-register saved fonts. Failures are logged and skipped.
    ///
    /// Returns the number of fonts restored.
    pub async fn restore(&self, records: &[FontRecord]) -> usize {
        let mut restored = 0;
        for record in records {
            match self
                .register(&record.name, FontSource::DataUrl(record.data_url.clone()))
                .await
            {
                Ok(()) => restored += 1,
                Err(e) => tracing::warn!("Skipping saved font {}: {e}", record.name),
            }
        }
        restored
    }

    /// Snapshot of the font database for the rasterizer.
    #[must_use]
    pub fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.read().db)
    }

    /// Number of font faces known to the registry.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.read().db.len()
    }

    /// Whether `family` has a glyph for every non-whitespace character of
    /// `text`.
    #[must_use]
    pub fn covers(&self, family: &str, text: &str) -> bool {
        self.with_face(family, |face| face_covers(face, text))
            .unwrap_or(false)
    }

    fn with_face<T>(&self, family: &str, f: impl FnOnce(&ttf_parser::Face<'_>) -> T) -> Option<T> {
        let state = self.read();
        let stored = stored_family_name(&state.db, family)?;
        let id = state.db.query(&fontdb::Query {
            families: &[fontdb::Family::Name(&stored)],
            ..fontdb::Query::default()
        })?;
        state
            .db
            .with_face_data(id, |data, index| {
                ttf_parser::Face::parse(data, index).ok().map(|face| f(&face))
            })
            .flatten()
    }
}

impl TextMeasure for FontRegistry {
    fn resolve_family(&self, requested: &str, language: Language) -> Option<String> {
        let state = self.read();
        layout::family_names(requested)
            .chain(layout::family_names(language.default_family()))
            .find_map(|name| resolve_name(&state.db, name))
            .or_else(|| state.fallback(language))
    }

    fn line_width(&self, line: &str, family: Option<&str>, font_size: f32) -> f32 {
        family
            .and_then(|family| self.with_face(family, |face| advance_width(face, line, font_size)))
            .unwrap_or_else(|| HeuristicMeasure.line_width(line, None, font_size))
    }

    fn ascent_ratio(&self, family: Option<&str>) -> f32 {
        family
            .and_then(|family| {
                self.with_face(family, |face| {
                    let ascender = f32::from(face.ascender());
                    let extent = ascender - f32::from(face.descender());
                    (extent > 0.0).then(|| ascender / extent)
                })
            })
            .flatten()
            .unwrap_or(DEFAULT_ASCENT_RATIO)
    }
}

/// Sum of horizontal advances; characters without a glyph use the heuristic.
fn advance_width(face: &ttf_parser::Face<'_>, line: &str, font_size: f32) -> f32 {
    let units_per_em = f32::from(face.units_per_em().max(1));
    line.chars()
        .map(|c| {
            face.glyph_index(c)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map_or_else(
                    || HeuristicMeasure::char_ratio(c) * font_size,
                    |advance| f32::from(advance) * font_size / units_per_em,
                )
        })
        .sum()
}

fn face_covers(face: &ttf_parser::Face<'_>, text: &str) -> bool {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .all(|c| face.glyph_index(c).is_some())
}

/// First family able to draw the language's template text.
fn script_fallback(db: &fontdb::Database, language: Language) -> Option<String> {
    let sample = language.default_text();
    db.faces().find_map(|info| {
        let family = info.families.first().map(|(family, _)| family.clone())?;
        db.with_face_data(info.id, |data, index| {
            ttf_parser::Face::parse(data, index)
                .is_ok_and(|face| face_covers(&face, sample))
        })
        .unwrap_or(false)
        .then_some(family)
    })
}

/// Family name as stored in the database, matched case-insensitively.
fn stored_family_name(db: &fontdb::Database, name: &str) -> Option<String> {
    db.faces()
        .flat_map(|face| face.families.iter())
        .find(|(family, _)| family.eq_ignore_ascii_case(name))
        .map(|(family, _)| family.clone())
}

/// Resolve one name of a family list to a concrete family.
fn resolve_name(db: &fontdb::Database, name: &str) -> Option<String> {
    let generic = match name.to_ascii_lowercase().as_str() {
        "serif" => fontdb::Family::Serif,
        "sans-serif" => fontdb::Family::SansSerif,
        "monospace" => fontdb::Family::Monospace,
        "cursive" => fontdb::Family::Cursive,
        "fantasy" => fontdb::Family::Fantasy,
        _ => return stored_family_name(db, name),
    };
    let id = db.query(&fontdb::Query {
        families: &[generic],
        ..fontdb::Query::default()
    })?;
    db.face(id)
        .and_then(|face| face.families.first())
        .map(|(family, _)| family.clone())
}

fn configure_generic_families(db: &mut fontdb::Database) {
    let pick = |db: &fontdb::Database, candidates: &[&str]| {
        candidates
            .iter()
            .find_map(|name| stored_family_name(db, name))
    };
    if let Some(name) = pick(db, SERIF_CANDIDATES) {
        db.set_serif_family(name);
    }
    if let Some(name) = pick(db, SANS_SERIF_CANDIDATES) {
        db.set_sans_serif_family(name);
    }
    if let Some(name) = pick(db, MONOSPACE_CANDIDATES) {
        db.set_monospace_family(name);
    }
}
