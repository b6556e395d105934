//! End-to-end tests for the layout stages and the chunker.

use std::collections::BTreeSet;
use std::sync::Arc;

use structchunk::{
    BBox, Block, BlockKind, Chunk, ChunkType, Chunker, ChunkerOptions, DocumentChunker,
    MemorySource, Page, Span, TextLine, TextRun, WhitespaceTokenizer,
};

fn line(text: &str, size: f32, bold: bool, y0: f32) -> TextLine {
    TextLine::from_runs(vec![TextRun::new(
        text,
        size,
        bold,
        BBox::new(72.0, y0, 520.0, y0 + size),
    )])
}

fn chunker(options: ChunkerOptions) -> DocumentChunker {
    DocumentChunker::with_tokenizer(options, Arc::new(WhitespaceTokenizer)).unwrap()
}

fn paragraph(text: &str, page: u32) -> Block {
    let span = Span::text(text, 10.0, false, BBox::new(72.0, 300.0, 520.0, 310.0), page, 0, 0);
    Block::new(BlockKind::Paragraph, text, page, vec![span])
}

fn heading(text: &str, level: u8, page: u32) -> Block {
    let span = Span::text(text, 14.0, true, BBox::new(72.0, 100.0, 520.0, 114.0), page, 0, 0);
    let mut block = Block::new(BlockKind::Heading, text, page, vec![span]);
    block.heading_level = Some(level);
    block
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

#[test]
fn test_heading_then_paragraph_gives_one_chunk() {
    let mut page = Page::letter(1);
    page.add_text(vec![line("1 Introduction", 14.0, true, 100.0)]);
    page.add_text(vec![
        line("The pump moves water from the well.", 10.0, false, 130.0),
        line("It runs on a single phase supply.", 10.0, false, 142.0),
        line("Read the safety notes before use.", 10.0, false, 154.0),
    ]);
    let source = MemorySource::new(vec![page]);

    let chunks = chunker(ChunkerOptions::default())
        .chunk_source("manual.pdf", &source)
        .unwrap();

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].heading_path, vec!["1 Introduction"]);
    assert_eq!(chunks[0].chunk_type, ChunkType::Paragraph);
    assert_eq!(chunks[0].chunk_id, 1);
    assert_eq!(chunks[0].pages, vec![1]);
    assert!(chunks[0].text.starts_with("The pump moves water"));
}

fn pages_with_header(count: u32) -> MemorySource {
    let pages = (1..=count)
        .map(|n| {
            let mut page = Page::letter(n);
            page.add_text(vec![line("ACME Pump Manual", 9.0, false, 20.0)]);
            page.add_text(vec![line(
                &format!("Body text for page {} of the manual.", n),
                10.0,
                false,
                300.0,
            )]);
            page
        })
        .collect();
    MemorySource::new(pages)
}

#[test]
fn test_repeated_header_removed_from_every_page() {
    let source = pages_with_header(4);

    let analysis = chunker(ChunkerOptions::default()).analyze(&source, None).unwrap();
    assert_eq!(analysis.layout.stats.spans_dropped_margins, 4);
    assert!(analysis
        .layout
        .blocks
        .iter()
        .all(|b| !b.text.contains("ACME")));

    let options = ChunkerOptions::default().with_header_removal(false);
    let analysis = chunker(options).analyze(&source, None).unwrap();
    assert_eq!(analysis.layout.stats.spans_dropped_margins, 0);
    let headers = analysis
        .layout
        .blocks
        .iter()
        .filter(|b| b.text == "ACME Pump Manual")
        .count();
    assert_eq!(headers, 4);
}

#[test]
fn test_paragraph_continues_across_page_break() {
    let mut first = Page::letter(1);
    first.add_text(vec![line("The pump must be primed with clean water", 10.0, false, 690.0)]);
    let mut second = Page::letter(2);
    second.add_text(vec![line("before the first start.", 10.0, false, 72.0)]);
    let source = MemorySource::new(vec![first, second]);
    let chunker = chunker(ChunkerOptions::default());

    let analysis = chunker.analyze(&source, None).unwrap();
    let blocks = &analysis.layout.blocks;
    assert_eq!(blocks.len(), 1);
    assert_eq!(
        blocks[0].text,
        "The pump must be primed with clean water before the first start."
    );
    assert_eq!(blocks[0].pages().collect::<BTreeSet<_>>(), BTreeSet::from([1, 2]));

    let chunks = chunker.chunk_source("manual.pdf", &source).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].pages, vec![1, 2]);
}

#[test]
fn test_token_budget_flushes_before_overflowing_block() {
    let options = ChunkerOptions::default();
    let tokenizer = WhitespaceTokenizer;
    let blocks: Vec<Block> = (0..5).map(|_| paragraph(&words(400), 1)).collect();

    let chunks = Chunker::new("doc.pdf", &options, &tokenizer).chunk(blocks);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].blocks.len(), 3);
    assert_eq!(chunks[0].token_count, 1200);
    assert_eq!(chunks[1].blocks.len(), 2);
    assert_eq!(chunks[1].token_count, 800);
}

#[test]
fn test_token_budget_exactly_full_stays_together() {
    let options = ChunkerOptions::default();
    let tokenizer = WhitespaceTokenizer;
    let blocks: Vec<Block> = (0..4).map(|_| paragraph(&words(500), 1)).collect();

    let chunks = Chunker::new("doc.pdf", &options, &tokenizer).chunk(blocks);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].token_count, 1500);
    assert_eq!(chunks[1].token_count, 500);
}

#[test]
fn test_oversized_block_becomes_own_chunk() {
    let options = ChunkerOptions::default().with_max_tokens(100);
    let tokenizer = WhitespaceTokenizer;
    let blocks = vec![
        paragraph(&words(20), 1),
        paragraph(&words(250), 1),
        paragraph(&words(20), 1),
    ];

    let chunks = Chunker::new("doc.pdf", &options, &tokenizer).chunk(blocks);

    let counts: Vec<usize> = chunks.iter().map(|c| c.token_count).collect();
    assert_eq!(counts, vec![20, 250, 20]);
}

fn toc_document() -> MemorySource {
    let mut toc = Page::letter(1);
    toc.add_text(vec![line("Contents", 14.0, true, 80.0)]);
    toc.add_text(vec![line("1 Introduction ........ 2", 10.0, false, 120.0)]);
    toc.add_text(vec![line("2 Installation ........ 3", 10.0, false, 140.0)]);

    let mut intro = Page::letter(2);
    intro.add_text(vec![line("1 Introduction", 14.0, true, 100.0)]);
    intro.add_text(vec![line("The pump moves water.", 10.0, false, 130.0)]);

    let mut install = Page::letter(3);
    install.add_text(vec![line("2 Installation", 14.0, true, 100.0)]);
    install.add_text(vec![line("Mount it on a level base.", 10.0, false, 130.0)]);

    MemorySource::new(vec![toc, intro, install])
}

#[test]
fn test_toc_page_excluded() {
    let source = toc_document();
    let chunker = chunker(ChunkerOptions::default());

    let analysis = chunker.analyze(&source, None).unwrap();
    assert_eq!(analysis.layout.stats.toc_pages, vec![1]);
    assert_eq!(analysis.layout.stats.spans_dropped_toc, 3);
    assert!(analysis.layout.blocks.iter().all(|b| b.page != 1));

    let chunks = chunker.chunk_source("manual.pdf", &source).unwrap();
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| !c.text.contains("........")));
    assert!(chunks.iter().all(|c| !c.pages.contains(&1)));
    assert_eq!(chunks[0].heading_path, vec!["1 Introduction"]);
    assert_eq!(chunks[1].heading_path, vec!["2 Installation"]);
}

#[test]
fn test_toc_page_kept_when_included() {
    let source = toc_document();
    let analysis = chunker(ChunkerOptions::default().with_toc(true))
        .analyze(&source, None)
        .unwrap();
    assert_eq!(analysis.layout.stats.toc_pages, vec![1]);
    assert_eq!(analysis.layout.stats.spans_dropped_toc, 0);
    assert!(analysis.layout.blocks.iter().any(|b| b.page == 1));
}

#[test]
fn test_heading_path_truncates_at_level() {
    let options = ChunkerOptions::default().with_heading_break_level(3);
    let tokenizer = WhitespaceTokenizer;
    let blocks = vec![
        heading("1 Setup", 1, 1),
        paragraph("Unpack the unit.", 1),
        heading("1.1 Tools", 2, 1),
        paragraph("You need a wrench.", 1),
        heading("1.1.1 Wrench size", 3, 1),
        paragraph("Use a 13 mm wrench.", 1),
        heading("2 Operation", 1, 1),
        paragraph("Press start.", 1),
    ];

    let chunks = Chunker::new("doc.pdf", &options, &tokenizer).chunk(blocks);

    let paths: Vec<Vec<String>> = chunks.iter().map(|c| c.heading_path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            vec!["1 Setup".to_string()],
            vec!["1 Setup".to_string(), "1.1 Tools".to_string()],
            vec![
                "1 Setup".to_string(),
                "1.1 Tools".to_string(),
                "1.1.1 Wrench size".to_string()
            ],
            vec!["2 Operation".to_string()],
        ]
    );
}

#[test]
fn test_deep_numbered_heading_stays_in_chunk() {
    let options = ChunkerOptions::default();
    let tokenizer = WhitespaceTokenizer;
    let blocks = vec![
        heading("1 Setup", 1, 1),
        paragraph("Unpack the unit.", 1),
        heading("1.1.1 Wrench size", 3, 1),
        paragraph("Use a 13 mm wrench.", 1),
    ];

    let chunks = Chunker::new("doc.pdf", &options, &tokenizer).chunk(blocks);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chunk_type, ChunkType::Mixed);
    assert_eq!(chunks[0].text, "Unpack the unit.\n1.1.1 Wrench size");
    assert_eq!(
        chunks[1].heading_path,
        vec!["1 Setup".to_string(), "1.1.1 Wrench size".to_string()]
    );
}

fn sample_manual() -> MemorySource {
    let mut pages = Vec::new();
    for n in 1..=3u32 {
        let mut page = Page::letter(n);
        page.add_text(vec![line(&format!("{} Section {}", n, n), 14.0, true, 100.0)]);
        page.add_text(vec![
            line("The pump moves water from the well.", 10.0, false, 130.0),
            line("It runs on a single phase supply.", 10.0, false, 142.0),
        ]);
        page.add_text(vec![line("• Check the seals weekly", 10.0, false, 200.0)]);
        page.add_text(vec![line("• Replace the filter yearly", 10.0, false, 214.0)]);
        pages.push(page);
    }
    MemorySource::new(pages)
}

fn assert_chunk_invariants(chunks: &[Chunk]) {
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_id as usize, i + 1);
        assert!(!chunk.blocks.iter().all(Block::is_heading));
        assert!(chunk.pages.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_chunk_invariants() {
    let source = sample_manual();
    let chunker = chunker(ChunkerOptions::default());

    let analysis = chunker.analyze(&source, None).unwrap();
    let span_pages: BTreeSet<u32> = analysis.layout.spans.iter().map(|s| s.page).collect();

    let chunks = chunker.chunk_source("manual.pdf", &source).unwrap();
    assert_chunk_invariants(&chunks);
    let chunk_pages: BTreeSet<u32> = chunks.iter().flat_map(|c| c.pages.clone()).collect();
    assert_eq!(chunk_pages, span_pages);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.chunk_type == ChunkType::Mixed));
    assert_eq!(
        chunks[0].block_kinds,
        vec![BlockKind::Paragraph, BlockKind::ListItem]
    );
}

#[test]
fn test_output_is_deterministic() {
    let source = sample_manual();
    let chunker = chunker(ChunkerOptions::default());

    let first = serde_json::to_string(&chunker.chunk_source("manual.pdf", &source).unwrap()).unwrap();
    let second = serde_json::to_string(&chunker.chunk_source("manual.pdf", &source).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_document() {
    let source = MemorySource::new(vec![Page::letter(1)]);
    let chunks = chunker(ChunkerOptions::default())
        .chunk_source("empty.pdf", &source)
        .unwrap();
    assert!(chunks.is_empty());
}
