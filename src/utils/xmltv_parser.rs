//! Quick-XML based XMLTV reader
//!
//! Streams an XMLTV document into a [`SourceDocument`]. Only the elements the
//! merge and the writer care about are extracted; anything else is skipped.
//! Timestamps are kept as the source wrote them.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::errors::{SourceError, SourceResult};
use crate::models::{DisplayName, EpgChannel, EpgProgramme, EpisodeNumber, Rating, SourceDocument};

const SOURCE_TYPE: &str = "xmltv";

fn parse_error<M: Into<String>>(message: M) -> SourceError {
    SourceError::parse_error(SOURCE_TYPE, message)
}

/// Parse XMLTV content into a source document tagged with `source`
///
/// The root element must be `<tv>`; a document with any other root, or with
/// broken markup, is rejected as a whole.
pub fn parse_xmltv_document(content: &str, source: &str) -> SourceResult<SourceDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut document = SourceDocument::new(source);
    let mut saw_root = false;

    let mut current_channel: Option<EpgChannel> = None;
    let mut current_programme: Option<EpgProgramme> = None;
    // Attributes of the innermost open element, needed when its text arrives
    let mut current_attrs: HashMap<String, String> = HashMap::new();
    let mut rating_system: Option<Option<String>> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = element_name(e)?;
                if !saw_root {
                    check_root(&name)?;
                    saw_root = true;
                    continue;
                }
                let attrs = parse_attributes(e);

                match name.as_str() {
                    "channel" => current_channel = Some(channel_from_attrs(&attrs)),
                    "programme" => current_programme = Some(programme_from_attrs(&attrs)),
                    "rating" if current_programme.is_some() => {
                        rating_system = Some(attrs.get("system").cloned());
                    }
                    _ => {}
                }

                current_attrs = attrs;
                current_text.clear();
            }

            Ok(Event::Empty(ref e)) => {
                let name = element_name(e)?;
                if !saw_root {
                    check_root(&name)?;
                    saw_root = true;
                    continue;
                }
                let attrs = parse_attributes(e);

                match name.as_str() {
                    "channel" => document.channels.push(channel_from_attrs(&attrs)),
                    "programme" => document.programmes.push(programme_from_attrs(&attrs)),
                    "icon" => {
                        let src = attrs.get("src").filter(|s| !s.is_empty()).cloned();
                        if let Some(programme) = current_programme.as_mut() {
                            if programme.icon.is_none() {
                                programme.icon = src;
                            }
                        } else if let Some(channel) = current_channel.as_mut() {
                            if channel.icon.is_none() {
                                channel.icon = src;
                            }
                        }
                    }
                    _ => {}
                }
            }

            Ok(Event::End(ref e)) => {
                let name = std::str::from_utf8(e.name().as_ref())
                    .map_err(|e| parse_error(format!("Invalid UTF-8 in XML element name: {e}")))?
                    .to_string();
                let text = current_text.trim().to_string();

                if let Some(programme) = current_programme.as_mut() {
                    match name.as_str() {
                        "title" if programme.title.is_none() && !text.is_empty() => {
                            programme.title = Some(text);
                        }
                        "desc" if programme.description.is_none() && !text.is_empty() => {
                            programme.description = Some(text);
                        }
                        "sub-title" if programme.sub_title.is_none() && !text.is_empty() => {
                            programme.sub_title = Some(text);
                        }
                        "category" if !text.is_empty() => programme.categories.push(text),
                        "episode-num" if !text.is_empty() => {
                            programme.episode_numbers.push(EpisodeNumber {
                                system: current_attrs.get("system").cloned(),
                                value: text,
                            });
                        }
                        "value" if !text.is_empty() => {
                            if let Some(system) = rating_system.clone() {
                                programme.rating = Some(Rating {
                                    system,
                                    value: text,
                                });
                            }
                        }
                        "rating" => rating_system = None,
                        "date" if !text.is_empty() => programme.date = Some(text),
                        "language" if !text.is_empty() => programme.language = Some(text),
                        "programme" => {
                            if let Some(programme) = current_programme.take() {
                                document.programmes.push(programme);
                            }
                        }
                        _ => {}
                    }
                } else if let Some(channel) = current_channel.as_mut() {
                    match name.as_str() {
                        "display-name" if !text.is_empty() => {
                            channel.display_names.push(DisplayName {
                                value: text,
                                lang: current_attrs.get("lang").cloned(),
                            });
                        }
                        "channel" => {
                            if let Some(channel) = current_channel.take() {
                                document.channels.push(channel);
                            }
                        }
                        _ => {}
                    }
                }

                current_text.clear();
            }

            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| parse_error(format!("Invalid text content: {e}")))?;
                current_text.push_str(&text);
            }

            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(&e)
                    .map_err(|e| parse_error(format!("Invalid UTF-8 in CDATA: {e}")))?;
                current_text.push_str(text);
            }

            Ok(Event::Eof) => break,

            Err(e) => {
                return Err(parse_error(format!("XML parsing error: {e}")));
            }

            _ => {}
        }
    }

    if !saw_root {
        return Err(parse_error("Document has no <tv> root element"));
    }

    Ok(document)
}

fn element_name(element: &BytesStart) -> SourceResult<String> {
    std::str::from_utf8(element.name().as_ref())
        .map(str::to_string)
        .map_err(|e| parse_error(format!("Invalid UTF-8 in XML element name: {e}")))
}

fn check_root(name: &str) -> SourceResult<()> {
    if name == "tv" {
        Ok(())
    } else {
        Err(parse_error(format!(
            "Expected <tv> root element, found <{name}>"
        )))
    }
}

fn channel_from_attrs(attrs: &HashMap<String, String>) -> EpgChannel {
    EpgChannel {
        id: attrs.get("id").cloned().unwrap_or_default(),
        display_names: Vec::new(),
        icon: None,
    }
}

fn programme_from_attrs(attrs: &HashMap<String, String>) -> EpgProgramme {
    EpgProgramme {
        channel_id: attrs.get("channel").cloned().unwrap_or_default(),
        start: attrs.get("start").cloned().unwrap_or_default(),
        stop: attrs.get("stop").cloned(),
        ..Default::default()
    }
}

/// Parse XML attributes into a HashMap
fn parse_attributes(element: &BytesStart) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    for attr in element.attributes().flatten() {
        if let (Ok(key), Ok(value)) = (
            std::str::from_utf8(attr.key.as_ref()),
            attr.unescape_value(),
        ) {
            attrs.insert(key.to_string(), value.into_owned());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE tv SYSTEM "xmltv.dtd">
<tv generator-info-name="upstream">
  <channel id="bbc1.uk">
    <display-name lang="en">BBC One</display-name>
    <display-name>BBC1</display-name>
    <icon src="http://example.com/bbc1.png"/>
  </channel>
  <channel id="empty.uk"/>
  <programme start="20250101120000 +0000" stop="20250101130000 +0000" channel="bbc1.uk">
    <title lang="en">News &amp; Weather</title>
    <sub-title>Lunchtime</sub-title>
    <desc><![CDATA[The latest <headlines>]]></desc>
    <category>News</category>
    <category>Current Affairs</category>
    <episode-num system="xmltv_ns">0.4.</episode-num>
    <rating system="VCHIP"><value>TV-G</value></rating>
    <date>2025</date>
    <icon src="http://example.com/news.png"/>
  </programme>
  <programme start="20250101130000 +0000" channel="bbc1.uk"/>
</tv>"#;

    #[test]
    fn test_parse_channels() {
        let doc = parse_xmltv_document(SAMPLE, "upstream").unwrap();
        assert_eq!(doc.source, "upstream");
        assert_eq!(doc.channels.len(), 2);

        let bbc = &doc.channels[0];
        assert_eq!(bbc.id, "bbc1.uk");
        assert_eq!(bbc.display_names.len(), 2);
        assert_eq!(bbc.display_names[0].lang.as_deref(), Some("en"));
        assert_eq!(bbc.display_names[1].value, "BBC1");
        assert_eq!(bbc.icon.as_deref(), Some("http://example.com/bbc1.png"));

        assert!(doc.channels[1].display_names.is_empty());
    }

    #[test]
    fn test_parse_programmes() {
        let doc = parse_xmltv_document(SAMPLE, "upstream").unwrap();
        assert_eq!(doc.programmes.len(), 2);

        let news = &doc.programmes[0];
        assert_eq!(news.channel_id, "bbc1.uk");
        assert_eq!(news.start, "20250101120000 +0000");
        assert_eq!(news.stop.as_deref(), Some("20250101130000 +0000"));
        assert_eq!(news.title.as_deref(), Some("News & Weather"));
        assert_eq!(news.sub_title.as_deref(), Some("Lunchtime"));
        assert_eq!(news.description.as_deref(), Some("The latest <headlines>"));
        assert_eq!(news.categories, vec!["News", "Current Affairs"]);
        assert_eq!(news.episode_numbers[0].system.as_deref(), Some("xmltv_ns"));
        assert_eq!(news.episode_numbers[0].value, "0.4.");
        let rating = news.rating.as_ref().unwrap();
        assert_eq!(rating.system.as_deref(), Some("VCHIP"));
        assert_eq!(rating.value, "TV-G");
        assert_eq!(news.date.as_deref(), Some("2025"));
        assert_eq!(news.icon.as_deref(), Some("http://example.com/news.png"));

        let bare = &doc.programmes[1];
        assert!(bare.title.is_none());
        assert!(bare.stop.is_none());
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = parse_xmltv_document("<rss><channel/></rss>", "feed").unwrap_err();
        assert!(matches!(err, SourceError::ParseError { .. }));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse_xmltv_document("", "feed").is_err());
    }

    #[test]
    fn test_malformed_markup_rejected() {
        let result = parse_xmltv_document("<tv><channel id=\"a\"></tv>", "feed");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_tv_is_valid() {
        let doc = parse_xmltv_document("<tv/>", "feed").unwrap();
        assert!(doc.channels.is_empty());
        assert!(doc.programmes.is_empty());
    }
}
