//! Feed publication: the post-run transfer of completed feed files to the
//! export destination, plus the public `feed.xml` index listing them.

use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::ExportError;
use crate::config::Config;

/// Transfer completed feeds to the configured export path.
///
/// Writes a well-formed `<links>` index at `<export_path>/feed.xml` naming
/// each feed file's public URL, replaces `<export_path>/feeds` with the
/// working directory's contents, and recreates an empty working directory
/// for the next run. No-op when no export path is configured or no feed
/// files were produced.
pub fn publish_feeds(config: &Config) -> Result<(), ExportError> {
    let Some(export_path) = config.export_path.as_deref() else {
        tracing::warn!("Export enabled but no export_path configured, skipping transfer");
        return Ok(());
    };

    let feed_files = list_feed_files(&config.feeds_dir)?;
    if feed_files.is_empty() {
        tracing::info!("No feed files produced, skipping transfer");
        return Ok(());
    }

    std::fs::create_dir_all(export_path)?;

    let index = feed_index(&config.app_url, &feed_files)?;
    std::fs::write(export_path.join("feed.xml"), index)?;

    let destination = export_path.join("feeds");
    if destination.exists() {
        std::fs::remove_dir_all(&destination)?;
    }
    std::fs::rename(&config.feeds_dir, &destination)?;
    std::fs::create_dir_all(&config.feeds_dir)?;

    tracing::info!(
        files = feed_files.len(),
        destination = %destination.display(),
        "Published feeds"
    );
    Ok(())
}

/// Feed file names in the working directory, sorted for a stable index.
pub fn list_feed_files(feeds_dir: &Path) -> Result<Vec<String>, ExportError> {
    let mut names = Vec::new();
    match std::fs::read_dir(feeds_dir) {
        Ok(entries) => {
            for entry in entries {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    names.sort();
    Ok(names)
}

/// Build the `feed.xml` index document:
/// `<links><loc>{app_url}/feeds/{file}</loc>…</links>` with an XML
/// declaration.
fn feed_index(app_url: &str, feed_files: &[String]) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(std::io::Error::other)?;
    writer
        .write_event(Event::Start(BytesStart::new("links")))
        .map_err(std::io::Error::other)?;
    for file in feed_files {
        writer
            .write_event(Event::Start(BytesStart::new("loc")))
            .map_err(std::io::Error::other)?;
        writer
            .write_event(Event::Text(BytesText::new(&format!(
                "{app_url}/feeds/{file}"
            ))))
            .map_err(std::io::Error::other)?;
        writer
            .write_event(Event::End(BytesEnd::new("loc")))
            .map_err(std::io::Error::other)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("links")))
        .map_err(std::io::Error::other)?;

    let bytes = writer.into_inner().into_inner();
    let mut document = String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    document.push('\n');
    Ok(document)
}
