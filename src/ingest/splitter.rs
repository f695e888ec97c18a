//! Character-window text splitting with separator-aware cuts.

/// Cut points tried in order of preference: paragraph break, line break,
/// sentence end, word gap.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split text into overlapping chunks of at most `chunk_size`
    /// characters. The next window resumes `chunk_overlap` characters
    /// before the previous cut, so nothing between two cuts is skipped.
    /// Whitespace-only windows are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let window: String = chars[start..end].iter().collect();

            if end == total {
                let piece = window.trim();
                if !piece.is_empty() {
                    chunks.push(piece.to_string());
                }
                break;
            }

            let piece = cut_at_separator(&window);
            let taken = piece.chars().count();

            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }

            start += taken.saturating_sub(self.chunk_overlap).max(1);
        }

        chunks
    }
}

/// Prefer ending the window at a separator instead of mid-word. Searches
/// the last fifth of the window for each separator in ladder order.
fn cut_at_separator(window: &str) -> String {
    let mut search_start = (window.len() * 80) / 100;
    while search_start < window.len() && !window.is_char_boundary(search_start) {
        search_start += 1;
    }

    let tail = &window[search_start..];
    for separator in SEPARATORS {
        if let Some(pos) = tail.rfind(separator) {
            let cut = search_start + pos + separator.len();
            return window[..cut].to_string();
        }
    }

    window.to_string()
}
