//! Command implementations.

use std::sync::Arc;

use serde_json::{json, Value};
use verse_core::layout::{self, TextMeasure};
use verse_core::{
    Background, Color, EditorConfig, EditorError, ElementId, ElementPatch, Language,
};
use verse_renderer::{ExportConfig, ExportMode, Exporter, FontSource};

use crate::workspace::Workspace;
use crate::{
    AddArgs, AddFontArgs, BackgroundArgs, CliArgs, CliError, CliResult, Command, DeleteArgs,
    ExportArgs, UpdateArgs,
};

/// Run a parsed command and return the text to print.
///
/// # Errors
///
/// Returns an error if the command's input is invalid, the state file cannot
/// be saved, or the export fails.
pub async fn run(args: &CliArgs) -> CliResult<String> {
    let config = EditorConfig::from(args);
    let mut workspace =
        Workspace::open(args.command.state(), config, !args.no_system_fonts).await?;

    match &args.command {
        Command::Export(export) => run_export(&mut workspace, export),
        Command::Add(add) => run_add(&mut workspace, add),
        Command::Update(update) => run_update(&mut workspace, update),
        Command::Delete(delete) => run_delete(&mut workspace, delete),
        Command::AddFont(add_font) => run_add_font(&mut workspace, add_font).await,
        Command::Inspect(_) => inspect(&workspace),
        Command::Background(background) => run_background(&mut workspace, background),
    }
}

fn run_export(workspace: &mut Workspace, args: &ExportArgs) -> CliResult<String> {
    let session = workspace.session_mut();
    session.on_frame();

    let config = ExportConfig {
        mode: args.content_bounds.then_some(ExportMode::Content),
        ..ExportConfig::from(session.config())
    };
    let exporter = Exporter::new(config, Arc::clone(workspace.fonts()));
    let image = exporter.render(workspace.session().document())?;
    let path = image.save_to(&args.out)?;
    let mut report = format!(
        "Exported {}x{} to {}",
        image.width,
        image.height,
        path.display()
    );
    for id in &image.unpainted {
        report.push_str(&format!(
            "\nwarning: no font can draw element {id}, its text is missing"
        ));
    }
    Ok(report)
}

fn run_add(workspace: &mut Workspace, args: &AddArgs) -> CliResult<String> {
    let language: Language = args.language.parse().map_err(CliError::InvalidLanguage)?;
    let color = args.color.as_deref().map(Color::parse).transpose()?;
    let patch = ElementPatch {
        text: args.text.clone(),
        font_size: args.font_size,
        font_family: args.font_family.clone().map(Some),
        color,
        ..ElementPatch::default()
    };

    let session = workspace.session_mut();
    let id = session.add_text(language);
    if !patch.is_empty() {
        session.document_mut().update(id, &patch);
    }
    session.on_frame();

    let (x, y) = session
        .document()
        .get(id)
        .map(|el| (el.x, el.y))
        .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
    workspace.save()?;
    Ok(format!("Added {language} element {id} at ({x:.1}, {y:.1})"))
}

fn run_update(workspace: &mut Workspace, args: &UpdateArgs) -> CliResult<String> {
    let id = existing_element(workspace, &args.id)?;
    let color = args.color.as_deref().map(Color::parse).transpose()?;
    let patch = ElementPatch {
        text: args.text.clone(),
        x: args.x,
        y: args.y,
        font_size: args.font_size,
        font_family: args
            .font_family
            .as_deref()
            .map(|family| (!family.trim().is_empty()).then(|| family.trim().to_string())),
        color,
    };
    if patch.is_empty() {
        return Ok(format!("Nothing to change for element {id}"));
    }

    workspace.session_mut().document_mut().update(id, &patch);
    workspace.save()?;
    Ok(format!("Updated element {id}"))
}

fn run_delete(workspace: &mut Workspace, args: &DeleteArgs) -> CliResult<String> {
    let id = parse_id(&args.id)?;
    let removed = workspace
        .session_mut()
        .document_mut()
        .delete(id)
        .ok_or_else(|| EditorError::ElementNotFound(id.to_string()))?;
    workspace.save()?;
    Ok(format!("Deleted {} element {id}", removed.language))
}

async fn run_add_font(workspace: &mut Workspace, args: &AddFontArgs) -> CliResult<String> {
    let target = args
        .apply_to
        .as_deref()
        .map(|raw| existing_element(workspace, raw))
        .transpose()?;

    workspace
        .fonts()
        .register(&args.name, font_source(&args.source))
        .await?;
    let name = args.name.trim();
    let mut report = format!("Registered font {name} in {}", workspace.path().display());

    if let Some(id) = target {
        workspace
            .session_mut()
            .document_mut()
            .update(id, &ElementPatch::font_family(Some(name.to_string())));
        report.push_str(&format!("\nApplied {name} to element {id}"));
    }
    workspace.save()?;
    Ok(report)
}

/// URLs are fetched by the registry; anything else is a local path.
fn font_source(raw: &str) -> FontSource {
    if raw.contains("://") || raw.starts_with("data:") {
        FontSource::Url(raw.to_string())
    } else {
        FontSource::Path(raw.into())
    }
}

fn parse_id(raw: &str) -> CliResult<ElementId> {
    ElementId::parse(raw.trim()).map_err(|_| CliError::InvalidId(raw.to_string()))
}

fn existing_element(workspace: &Workspace, raw: &str) -> CliResult<ElementId> {
    let id = parse_id(raw)?;
    if workspace.session().document().contains(id) {
        Ok(id)
    } else {
        Err(EditorError::ElementNotFound(id.to_string()).into())
    }
}

fn inspect(workspace: &Workspace) -> CliResult<String> {
    let document = workspace.session().document();
    let measurer: &dyn TextMeasure = &**workspace.fonts();

    let elements: Vec<Value> = document
        .elements()
        .map(|el| {
            let block = layout::measure_element(el, measurer);
            json!({
                "id": el.id.to_string(),
                "language": el.language,
                "text": el.text,
                "x": el.x,
                "y": el.y,
                "fontSize": el.font_size,
                "color": el.color,
                "fontFamily": el.requested_family(),
                "resolvedFamily": block.resolved_family,
                "lineCount": block.line_count,
                "lineWidths": block.line_widths,
                "blockWidth": block.block_width,
                "blockHeight": block.block_height,
            })
        })
        .collect();

    let report = json!({
        "surface": document.surface(),
        "canvasBackground": document.background(),
        "exportFullCanvas": document.export_full_surface,
        "fonts": workspace.fonts().list(),
        "textElements": elements,
    });
    Ok(serde_json::to_string_pretty(&report).map_err(EditorError::from)?)
}

fn run_background(workspace: &mut Workspace, args: &BackgroundArgs) -> CliResult<String> {
    let background: Background = args.value.parse()?;
    workspace
        .session_mut()
        .document_mut()
        .set_background(background);
    workspace.save()?;
    Ok(format!("Background set to {background}"))
}
