//! Static HTML comparison page.
//!
//! Output depends only on the catalog and options, so re-rendering an
//! unchanged catalog reproduces the page byte for byte.

use std::fmt;

use crate::{Catalog, Example, Method};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            image_width: 360,
            image_height: 200,
        }
    }
}

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em auto; max-width: 1600px; color: #222; }
header { margin-bottom: 2em; }
section.example { margin-bottom: 3em; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(370px, 1fr)); gap: 1em; }
figure { margin: 0; }
figcaption { font-weight: bold; margin-bottom: 0.3em; }
audio { width: 100%; }
img { display: block; background: #f0f0f0; }
.missing { color: #a00; font-style: italic; }
";

pub fn render_page(catalog: &Catalog, options: &PageOptions) -> String {
    Page { catalog, options }.to_string()
}

struct Page<'a> {
    catalog: &'a Catalog,
    options: &'a PageOptions,
}

impl fmt::Display for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let catalog = self.catalog;
        writeln!(f, "<!DOCTYPE html>")?;
        writeln!(f, "<html lang=\"en\">")?;
        writeln!(f, "<head>")?;
        writeln!(f, "<meta charset=\"utf-8\">")?;
        writeln!(f, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
        writeln!(f, "<title>{}</title>", Escaped(&catalog.title))?;
        writeln!(f, "<style>\n{STYLE}</style>")?;
        writeln!(f, "</head>")?;
        writeln!(f, "<body>")?;

        writeln!(f, "<header>")?;
        writeln!(f, "<h1>{}</h1>", Escaped(&catalog.title))?;
        if !catalog.description.is_empty() {
            writeln!(f, "<p>{}</p>", Escaped(&catalog.description))?;
        }
        if let Some(url) = &catalog.code_url {
            writeln!(f, "<p><a href=\"{}\">Code</a></p>", Escaped(url))?;
        }
        writeln!(f, "</header>")?;

        for example in &catalog.examples {
            self.example(f, example)?;
        }

        writeln!(f, "</body>")?;
        writeln!(f, "</html>")
    }
}

impl Page<'_> {
    fn example(&self, f: &mut fmt::Formatter<'_>, example: &Example) -> fmt::Result {
        let id = Escaped(&example.id);
        writeln!(f, "<section class=\"example\" id=\"example-{id}\">")?;
        writeln!(f, "<h2>{id}</h2>")?;
        writeln!(f, "<div class=\"grid\">")?;

        for method in Method::ALL {
            let label = method.label();
            writeln!(f, "<figure class=\"method\" data-method=\"{label}\">")?;
            writeln!(f, "<figcaption>{label}</figcaption>")?;
            match example.entry(method) {
                Some(entry) => {
                    writeln!(
                        f,
                        "<audio controls preload=\"none\" src=\"{}\"></audio>",
                        Escaped(entry.audio.as_str())
                    )?;
                    writeln!(
                        f,
                        "<img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"{label} spectrogram of {id}\" loading=\"lazy\">",
                        Escaped(entry.spectrogram.as_str()),
                        self.options.image_width,
                        self.options.image_height,
                    )?;
                }
                None => writeln!(f, "<p class=\"missing\">not available</p>")?,
            }
            writeln!(f, "</figure>")?;
        }

        writeln!(f, "</div>")?;
        writeln!(f, "</section>")
    }
}

/// HTML-escapes text for element content and double-quoted attributes.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            let escaped = match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(escaped)?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetRef, SampleEntry};

    fn catalog() -> Catalog {
        Catalog {
            title: "VPVID <demo>".into(),
            description: "Speech enhancement & friends".into(),
            code_url: Some("https://example.org/code?a=1&b=2".into()),
            examples: vec![Example {
                id: "051o0211".into(),
                // deliberately out of display order
                entries: Method::ALL
                    .into_iter()
                    .rev()
                    .map(|method| SampleEntry {
                        method,
                        audio: AssetRef::new(format!("input_wsj0c3/{}/051o0211.wav", method.slug())),
                        spectrogram: AssetRef::new(format!("spectrograms/{}/051o0211.png", method.slug())),
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(Escaped(r#"a<b>&"c"'d"#).to_string(), "a&lt;b&gt;&amp;&quot;c&quot;&#39;d");
        assert_eq!(Escaped("plain").to_string(), "plain");

        let html = render_page(&catalog(), &PageOptions::default());
        assert!(html.contains("<h1>VPVID &lt;demo&gt;</h1>"));
        assert!(html.contains("href=\"https://example.org/code?a=1&amp;b=2\""));
    }

    #[test]
    fn methods_render_in_display_order() {
        let html = render_page(&catalog(), &PageOptions::default());
        let positions: Vec<usize> = Method::ALL
            .iter()
            .map(|m| html.find(&format!("data-method=\"{}\"", m.label())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(html.contains("src=\"spectrograms/vpvid_sdec/051o0211.png\" width=\"360\" height=\"200\""));
    }

    #[test]
    fn missing_entry_gets_a_placeholder() {
        let mut catalog = catalog();
        catalog.examples[0].entries.retain(|e| e.method != Method::Vpidm);
        let html = render_page(&catalog, &PageOptions::default());
        assert_eq!(html.matches("class=\"missing\"").count(), 1);
        assert_eq!(html.matches("<audio ").count(), 7);
    }
}
