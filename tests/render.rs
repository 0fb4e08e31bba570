use folio::markdown::{
    self, AssetDir, Block, ListItem, NoAssets, TocHeading, extract_table_of_contents,
    render_markdown,
};

fn toc(id: &str, text: &str, level: u8) -> TocHeading {
    TocHeading {
        id: id.to_string(),
        text: text.to_string(),
        level,
    }
}

fn heading(level: u8, id: &str, html: &str) -> Block {
    Block::Heading {
        level,
        id: id.to_string(),
        html: html.to_string(),
    }
}

#[test]
fn heading_and_paragraph() {
    let source = "## Hello World\n\nSome *text*.";
    assert_eq!(
        extract_table_of_contents(source),
        vec![toc("hello-world", "Hello World", 2)]
    );
    assert_eq!(
        render_markdown(source, None, &NoAssets),
        vec![
            heading(2, "hello-world", "Hello World"),
            Block::Paragraph {
                html: "Some <em>text</em>.".to_string()
            },
        ]
    );
}

#[test]
fn duplicate_headings() {
    let source = "## Intro\n\n## Intro";
    assert_eq!(
        extract_table_of_contents(source),
        vec![toc("intro", "Intro", 2), toc("intro-2", "Intro", 2)]
    );
    assert_eq!(
        render_markdown(source, None, &NoAssets),
        vec![heading(2, "intro", "Intro"), heading(2, "intro-2", "Intro")]
    );
}

#[test]
fn toc_and_blocks_agree_on_ids() {
    let source = "# Title\r\n\r\n## Setup\r\n\r\n##### Deep\r\n\r\n## Setup\r\n\r\n### Step `one`";
    let toc_ids: Vec<String> = extract_table_of_contents(source)
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(toc_ids, ["setup", "setup-2", "step-one"]);

    let block_ids: Vec<String> = render_markdown(source, None, &NoAssets)
        .into_iter()
        .filter_map(|b| match b {
            Block::Heading { level: 2..=4, id, .. } => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(block_ids, toc_ids);
}

/// Heading ids in the outline, including headings nested in list items.
fn heading_ids(blocks: &[Block], out: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Heading { level: 2..=4, id, .. } => out.push(id.clone()),
            Block::List { items, .. } => {
                for item in items {
                    heading_ids(&item.children, out);
                }
            }
            _ => {}
        }
    }
}

#[test]
fn toc_sees_headings_inside_lists() {
    let source = "- item\n  ## Step\n\n## Step";
    let toc_ids: Vec<String> = extract_table_of_contents(source)
        .into_iter()
        .map(|h| h.id)
        .collect();
    assert_eq!(toc_ids, ["step", "step-2"]);

    let mut block_ids = vec![];
    heading_ids(&render_markdown(source, None, &NoAssets), &mut block_ids);
    assert_eq!(block_ids, toc_ids);

    let (html, toc) = markdown::render(source, None, &NoAssets);
    assert_eq!(toc.len(), 2);
    assert!(html.contains("<h2 id=\"step\">Step</h2>\n</li>"));
    assert!(html.ends_with("<h2 id=\"step-2\">Step</h2>\n"));
}

#[test]
fn python_code_block() {
    let blocks = render_markdown("```py\n# comment\nx = 1\n```", None, &NoAssets);
    let [Block::Code {
        raw,
        highlighted,
        language,
    }] = blocks.as_slice()
    else {
        panic!("expected one code block, got {blocks:?}");
    };
    assert_eq!(raw, "# comment\nx = 1");
    assert_eq!(language.as_deref(), Some("py"));
    assert!(highlighted.contains("<span class=\"tok-comment\"># comment</span>"));
    assert!(highlighted.contains("<span class=\"tok-number\">1</span>"));
}

#[test]
fn image_falls_back_to_cleaned_path() {
    assert_eq!(
        render_markdown("![alt](nested/pic.png)", Some("my-post"), &NoAssets),
        vec![Block::Image {
            src: "/blog/nested/pic.png".to_string(),
            alt: "alt".to_string(),
            title: None,
        }]
    );
}

#[test]
fn image_found_in_asset_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("my-post.webp"), b"img").unwrap();
    std::fs::write(dir.path().join("chart.png"), b"img").unwrap();
    let assets = AssetDir::new(dir.path());

    let srcs: Vec<String> = render_markdown(
        "![a](../images/chart.png)\n\n![b](missing.png)\n\n![c](https://x.org/y.png)",
        Some("my-post"),
        &assets,
    )
    .into_iter()
    .filter_map(|b| match b {
        Block::Image { src, .. } => Some(src),
        _ => None,
    })
    .collect();
    assert_eq!(
        srcs,
        ["/blog/chart.png", "/blog/my-post.webp", "https://x.org/y.png"]
    );
}

#[test]
fn raw_html_is_escaped() {
    let (html, _) = markdown::render("<script>alert(1)</script>", None, &NoAssets);
    assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>\n");
}

#[test]
fn javascript_links_are_dropped() {
    let (html, _) = markdown::render("[click](javascript:evil)", None, &NoAssets);
    assert_eq!(html, "<p><a href=\"#\">click</a></p>\n");
}

#[test]
fn fence_beats_everything() {
    let blocks = render_markdown("```\n## not heading\n- not list\n```", None, &NoAssets);
    assert!(matches!(blocks.as_slice(), [Block::Code { language: None, .. }]));
    assert_eq!(extract_table_of_contents("```\n## not heading\n```"), vec![]);
}

#[test]
fn table_then_paragraph() {
    assert_eq!(
        render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\ntext", None, &NoAssets),
        vec![
            Block::Table {
                header: vec!["a".to_string(), "b".to_string()],
                rows: vec![vec!["1".to_string(), "2".to_string()]],
            },
            Block::Paragraph {
                html: "text".to_string()
            },
        ]
    );
}

#[test]
fn nested_list_renders_recursively() {
    let blocks = render_markdown("1. first\n   - inner **bold**\n2. second", None, &NoAssets);
    assert_eq!(
        blocks,
        vec![Block::List {
            ordered: true,
            items: vec![
                ListItem {
                    html: "first".to_string(),
                    children: vec![Block::List {
                        ordered: false,
                        items: vec![ListItem {
                            html: "inner <strong>bold</strong>".to_string(),
                            children: vec![],
                        }],
                    }],
                },
                ListItem {
                    html: "second".to_string(),
                    children: vec![],
                },
            ],
        }]
    );
}

#[test]
fn html_output() {
    let (html, toc) = markdown::render(
        "## Usage\n\n```rust\nlet x = 1;\n```\n\n![Cat](cat.png \"A cat\")",
        None,
        &NoAssets,
    );
    assert_eq!(toc, vec![self::toc("usage", "Usage", 2)]);
    assert!(html.starts_with("<h2 id=\"usage\">Usage</h2>\n"));
    assert!(html.contains("<pre><code class=\"language-rust\">let x = 1;</code></pre>"));
    assert!(html.contains("class=\"copy-button\""));
    assert!(html.contains("<figcaption>A cat</figcaption>"));
}
