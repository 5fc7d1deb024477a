use serde::{Deserialize, Serialize};

use crate::config::ChunkerConfig;
use crate::model::{Chunk, ChunkMetadata, Document};

/// Length of the blank-line separator between paragraphs.
const SEPARATOR_LEN: usize = 2;

/// A chunk before it is attached to a document.
///
/// Offsets are character offsets into the source body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub metadata: ChunkMetadata,
}

/// Splits document bodies into overlapping, size-bounded chunks aligned to
/// paragraph boundaries.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

/// Character range of the chunk currently being built.
#[derive(Default)]
struct Buffer {
    start: usize,
    end: usize,
    headings: Vec<String>,
}

impl Buffer {
    fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Length in characters, counting every separator between paragraphs.
    fn len(&self) -> usize {
        self.end - self.start
    }

    fn append(&mut self, para_start: usize, para_end: usize) {
        if self.is_empty() {
            self.start = para_start;
        }
        self.end = para_end;
    }
}

/// Character-offset view of a body, so chunk content is always cut from it.
struct CharIndex<'a> {
    text: &'a str,
    byte_offsets: Vec<usize>,
}

impl<'a> CharIndex<'a> {
    fn new(text: &'a str) -> Self {
        let byte_offsets = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, byte_offsets }
    }

    fn char_count(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.byte_offsets[start]..self.byte_offsets[end]]
    }
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk a document's flattened body.
    ///
    /// Chunk ids are derived from the document id and the chunk position, so
    /// re-chunking an unchanged body yields identical chunks.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let body = document.body.as_deref().unwrap_or("");

        self.chunk_text(body)
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk {
                id: format!("{}#{}", document.id, index),
                document_id: document.id.clone(),
                scope_id: document.scope_id.clone(),
                content: span.content,
                start_offset: span.start_offset,
                end_offset: span.end_offset,
                metadata: span.metadata,
                embedding: None,
            })
            .collect()
    }

    /// Split plain text into chunk spans.
    ///
    /// A body shorter than `min_chunk_size` is one span over the whole body.
    /// Otherwise every span's content is exactly the body between its offsets,
    /// with leading blank lines and trailing whitespace left out of the range.
    pub fn chunk_text(&self, body: &str) -> Vec<ChunkSpan> {
        let index = CharIndex::new(body);
        let total_chars = index.char_count();

        if total_chars < self.config.min_chunk_size {
            return vec![ChunkSpan {
                content: body.trim().to_string(),
                start_offset: 0,
                end_offset: total_chars,
                metadata: ChunkMetadata::default(),
            }];
        }

        let mut spans = Vec::new();
        let mut buffer = Buffer::default();
        let mut section: Option<String> = None;
        let mut cursor = 0;

        for paragraph in body.split("\n\n") {
            let para_len = paragraph.chars().count();
            let para_start = cursor;
            let para_end = cursor + para_len;
            cursor = para_end + SEPARATOR_LEN;

            if paragraph.trim().is_empty() {
                continue;
            }

            let grown_len = if buffer.is_empty() {
                para_len
            } else {
                para_end - buffer.start
            };
            if grown_len > self.config.target_size && buffer.len() > self.config.min_chunk_size {
                buffer = self.flush_with_overlap(&index, buffer, section.as_deref(), &mut spans);
            }

            buffer.append(para_start, para_end);

            if let Some(heading) = last_heading(paragraph) {
                section = Some(heading.clone());
                buffer.headings.push(heading);
            }

            if buffer.len() > self.config.max_chunk_size {
                let full = std::mem::take(&mut buffer);
                spans.extend(self.force_split(&index, full, section.as_deref()));
            }
        }

        if !buffer.is_empty() {
            spans.extend(cut_span(
                &index,
                buffer.start,
                buffer.end,
                section.as_deref(),
                buffer.headings,
            ));
        }

        spans
    }

    /// Emit the buffer as a chunk and return a new buffer seeded with its tail.
    fn flush_with_overlap(
        &self,
        index: &CharIndex<'_>,
        buffer: Buffer,
        section: Option<&str>,
        spans: &mut Vec<ChunkSpan>,
    ) -> Buffer {
        let tail_len = self.config.overlap.min(buffer.len());
        let flushed_end = buffer.end;

        spans.extend(cut_span(
            index,
            buffer.start,
            buffer.end,
            section,
            buffer.headings,
        ));

        Buffer {
            start: flushed_end - tail_len,
            end: flushed_end,
            headings: Vec::new(),
        }
    }

    /// Cut an oversized buffer into consecutive, non-overlapping pieces.
    fn force_split(
        &self,
        index: &CharIndex<'_>,
        buffer: Buffer,
        section: Option<&str>,
    ) -> Vec<ChunkSpan> {
        let piece_size = self.config.max_chunk_size.max(1);
        let mut spans = Vec::with_capacity(buffer.len().div_ceil(piece_size));
        let mut piece_start = buffer.start;

        while piece_start < buffer.end {
            let piece_end = (piece_start + piece_size).min(buffer.end);
            let piece = index.slice(piece_start, piece_end);

            let headings: Vec<String> = buffer
                .headings
                .iter()
                .filter(|heading| piece.contains(heading.as_str()))
                .cloned()
                .collect();

            spans.extend(cut_span(index, piece_start, piece_end, section, headings));
            piece_start = piece_end;
        }

        spans
    }
}

/// Build the span for `[start, end)`, narrowed past leading blank lines and
/// trailing whitespace. `None` when nothing but whitespace remains.
fn cut_span(
    index: &CharIndex<'_>,
    start: usize,
    end: usize,
    section: Option<&str>,
    headings: Vec<String>,
) -> Option<ChunkSpan> {
    let raw = index.slice(start, end);
    let without_lead = raw.trim_start_matches(['\n', '\r']);
    let content = without_lead.trim_end();
    if content.is_empty() {
        return None;
    }

    // Stripped newlines are single-byte, so bytes equal characters here
    let leading = raw.len() - without_lead.len();
    let trailing = without_lead[content.len()..].chars().count();

    Some(ChunkSpan {
        content: content.to_string(),
        start_offset: start + leading,
        end_offset: end - trailing,
        metadata: build_metadata(raw, section, headings),
    })
}

fn build_metadata(raw: &str, section: Option<&str>, headings: Vec<String>) -> ChunkMetadata {
    ChunkMetadata {
        section: section.map(str::to_string),
        headings: if headings.is_empty() {
            None
        } else {
            Some(headings)
        },
        is_code_block: looks_like_code(raw).then_some(true),
    }
}

/// Fenced or indented code at the start of the chunk.
fn looks_like_code(text: &str) -> bool {
    let lead = text.trim_start_matches(['\n', '\r']);
    lead.starts_with("```")
        || lead.starts_with("~~~")
        || lead.starts_with("    ")
        || lead.starts_with('\t')
}

/// The last Markdown heading (`#`..`######` followed by text) in a paragraph.
fn last_heading(paragraph: &str) -> Option<String> {
    if looks_like_code(paragraph) {
        return None;
    }
    paragraph
        .lines()
        .filter_map(heading_text)
        .last()
        .map(str::to_string)
}

fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }

    let rest = &line[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }

    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}
