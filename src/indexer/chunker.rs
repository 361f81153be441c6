#[derive(Debug, Clone)]
pub struct TextChunk {
    pub text: String,
    pub chunk_index: usize,
}

/// Round a byte position up to the next char boundary.
fn ceil_char_boundary(text: &str, byte_pos: usize) -> usize {
    if byte_pos >= text.len() {
        return text.len();
    }
    let mut pos = byte_pos;
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

/// Round a byte position down to the previous char boundary.
fn floor_char_boundary(text: &str, byte_pos: usize) -> usize {
    if byte_pos >= text.len() {
        return text.len();
    }
    let mut pos = byte_pos;
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

pub fn chunk_text(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if text.len() <= max_chunk_size {
        return vec![TextChunk {
            text: text.to_string(),
            chunk_index: 0,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chunk_index = 0;

    while start < text.len() {
        let end = ceil_char_boundary(text, (start + max_chunk_size).min(text.len()));

        let actual_end = if end < text.len() {
            find_break_point(text, start, end)
        } else {
            end
        };

        let chunk_text = text[start..actual_end].trim().to_string();
        if !chunk_text.is_empty() {
            chunks.push(TextChunk {
                text: chunk_text,
                chunk_index,
            });
            chunk_index += 1;
        }

        let next_start = if actual_end > overlap {
            floor_char_boundary(text, actual_end - overlap)
        } else {
            actual_end
        };

        if next_start <= start {
            start = actual_end;
        } else {
            start = next_start;
        }
    }

    chunks
}

fn find_break_point(text: &str, start: usize, max_end: usize) -> usize {
    let segment = &text[start..max_end];

    if let Some(pos) = segment.rfind("\n\n") {
        return start + pos + 2;
    }
    if let Some(pos) = segment.rfind('\n') {
        return start + pos + 1;
    }
    for sentinel in [". ", "? ", "! ", "… "] {
        if let Some(pos) = segment.rfind(sentinel) {
            return start + pos + sentinel.len();
        }
    }
    if let Some(pos) = segment.rfind(' ') {
        return start + pos + 1;
    }
    max_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accented_text_chunks_on_char_boundaries() {
        let text = "La instalación ocupó tres salas del museo. Cada pieza dialogaba con la arquitectura del edificio. El público recorría la exposición en penumbra, guiado únicamente por la luz de las proyecciones.";
        let chunks = chunk_text(text, 80, 15);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
            assert!(chunk.text.len() <= 80 + 4);
        }
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let text = "Primer proyecto del catálogo.\n\nSegundo proyecto del catálogo con una descripción bastante más larga.";
        let chunks = chunk_text(text, 60, 10);
        assert!(chunks[0].text.ends_with("catálogo."));
    }

    #[test]
    fn small_text_single_chunk() {
        let chunks = chunk_text("corto", 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "corto");
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(chunk_text("", 100, 10).is_empty());
        assert!(chunk_text("   \n ", 100, 10).is_empty());
    }

    #[test]
    fn chunk_indexes_are_sequential() {
        let text = "uno dos tres cuatro cinco seis siete ocho nueve diez once doce trece catorce quince";
        let chunks = chunk_text(text, 20, 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }
}
