//! XMLTV writer for merged documents
//!
//! Output is channel-major: every `<channel>` block is written before the
//! first `<programme>`, in the order the merge produced them.

use quick_xml::escape::escape;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::errors::AppResult;
use crate::models::{EpgChannel, MergedDocument, MergedProgramme};

const XMLTV_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
"#;

#[derive(Debug, Clone, Default)]
pub struct XmltvGenerator {
    generator_info_name: Option<String>,
    generator_info_url: Option<String>,
}

impl XmltvGenerator {
    pub fn new(generator_info_name: Option<String>, generator_info_url: Option<String>) -> Self {
        Self {
            generator_info_name,
            generator_info_url,
        }
    }

    /// Render the whole document as an XMLTV string
    pub fn generate(&self, document: &MergedDocument) -> String {
        let mut xml = String::from(XMLTV_HEADER);
        xml.push_str(&self.root_open_tag());

        for channel in &document.channels {
            xml.push_str(&channel_block(channel));
        }
        for programme in &document.programmes {
            xml.push_str(&programme_block(programme));
        }

        xml.push_str("</tv>\n");
        xml
    }

    /// Write the document to `path`, creating parent directories as needed
    pub async fn write_to_file<P: AsRef<Path>>(
        &self,
        document: &MergedDocument,
        path: P,
    ) -> AppResult<u64> {
        let path = path.as_ref();
        let started = Instant::now();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = self.generate(document);
        let file = tokio::fs::File::create(path).await?;
        let mut writer = tokio::io::BufWriter::new(file);
        writer.write_all(content.as_bytes()).await?;
        writer.flush().await?;

        let bytes_written = content.len() as u64;
        info!(
            "XMLTV written: path={} channels={} programmes={} bytes={} duration={:?}",
            path.display(),
            document.channels.len(),
            document.programmes.len(),
            bytes_written,
            started.elapsed()
        );

        Ok(bytes_written)
    }

    fn root_open_tag(&self) -> String {
        let mut tag = String::from("<tv");
        if let Some(name) = &self.generator_info_name {
            tag.push_str(&format!(" generator-info-name=\"{}\"", escape(name)));
        }
        if let Some(url) = &self.generator_info_url {
            tag.push_str(&format!(" generator-info-url=\"{}\"", escape(url)));
        }
        tag.push_str(">\n");
        tag
    }
}

fn channel_block(channel: &EpgChannel) -> String {
    let mut block = format!("  <channel id=\"{}\">\n", escape(&channel.id));

    for name in &channel.display_names {
        match &name.lang {
            Some(lang) => block.push_str(&format!(
                "    <display-name lang=\"{}\">{}</display-name>\n",
                escape(lang),
                escape(&name.value)
            )),
            None => block.push_str(&format!(
                "    <display-name>{}</display-name>\n",
                escape(&name.value)
            )),
        }
    }

    if let Some(icon) = channel.icon.as_deref().filter(|i| !i.is_empty()) {
        block.push_str(&format!("    <icon src=\"{}\"/>\n", escape(icon)));
    }

    block.push_str("  </channel>\n");
    block
}

fn programme_block(programme: &MergedProgramme) -> String {
    let mut block = format!("  <programme start=\"{}\"", escape(&programme.start));
    if let Some(stop) = &programme.stop {
        block.push_str(&format!(" stop=\"{}\"", escape(stop)));
    }
    block.push_str(&format!(" channel=\"{}\">\n", escape(&programme.channel_id)));

    block.push_str(&format!("    <title>{}</title>\n", escape(&programme.title)));

    if let Some(sub_title) = &programme.sub_title {
        block.push_str(&format!("    <sub-title>{}</sub-title>\n", escape(sub_title)));
    }

    // An empty description is written as no element at all
    if !programme.description.is_empty() {
        block.push_str(&format!("    <desc>{}</desc>\n", escape(&programme.description)));
    }

    if let Some(date) = &programme.date {
        block.push_str(&format!("    <date>{}</date>\n", escape(date)));
    }

    for category in &programme.categories {
        block.push_str(&format!("    <category>{}</category>\n", escape(category)));
    }

    if let Some(language) = &programme.language {
        block.push_str(&format!("    <language>{}</language>\n", escape(language)));
    }

    if let Some(icon) = programme.icon.as_deref().filter(|i| !i.is_empty()) {
        block.push_str(&format!("    <icon src=\"{}\"/>\n", escape(icon)));
    }

    for episode in &programme.episode_numbers {
        match &episode.system {
            Some(system) => block.push_str(&format!(
                "    <episode-num system=\"{}\">{}</episode-num>\n",
                escape(system),
                escape(&episode.value)
            )),
            None => block.push_str(&format!(
                "    <episode-num>{}</episode-num>\n",
                escape(&episode.value)
            )),
        }
    }

    if let Some(rating) = &programme.rating {
        match &rating.system {
            Some(system) => block.push_str(&format!("    <rating system=\"{}\">\n", escape(system))),
            None => block.push_str("    <rating>\n"),
        }
        block.push_str(&format!("      <value>{}</value>\n", escape(&rating.value)));
        block.push_str("    </rating>\n");
    }

    block.push_str("  </programme>\n");
    block
}
