//! PDF page text.

use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;

/// Only the leading pages of a PDF are read.
pub const MAX_PDF_PAGES: usize = 5;

/// Page-ordered text access over a loaded document. Page numbers start at 1.
pub trait PageSource {
    fn page_count(&self) -> usize;
    fn page_text(&self, page_number: u32) -> Result<String, String>;
}

/// Reported when the PDF reader panics on a malformed document.
pub const MALFORMED_DOCUMENT: &str = "malformed document";

/// Concatenates the text of at most [`MAX_PDF_PAGES`] pages, in page order, with
/// no separator. A page whose text cannot be extracted contributes nothing,
/// including a page the reader panics on.
pub fn first_pages_text(source: &dyn PageSource) -> String {
    let pages = source.page_count().min(MAX_PDF_PAGES);
    let mut text = String::new();

    for page_number in 1..=pages {
        // `pages` is at most MAX_PDF_PAGES.
        let page_number = page_number as u32;
        let page = panic::catch_unwind(AssertUnwindSafe(|| source.page_text(page_number)))
            .unwrap_or_else(|_| Err(MALFORMED_DOCUMENT.to_string()));
        match page {
            Ok(page) => text.push_str(&page),
            Err(reason) => {
                tracing::debug!(page_number, %reason, "pdf page has no extractable text");
            }
        }
    }

    text
}

pub struct LopdfPages {
    document: Document,
    page_numbers: Vec<u32>,
}

impl LopdfPages {
    /// Parse failures and reader panics both come back as `Err`.
    pub fn load(bytes: &[u8]) -> Result<Self, String> {
        let loaded = panic::catch_unwind(|| {
            Document::load_mem(bytes).map(|document| {
                let page_numbers = document.get_pages().keys().copied().collect();
                Self {
                    document,
                    page_numbers,
                }
            })
        });

        match loaded {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(error)) => Err(error.to_string()),
            Err(_) => Err(MALFORMED_DOCUMENT.to_string()),
        }
    }
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, page_number: u32) -> Result<String, String> {
        self.document
            .extract_text(&[page_number])
            .map_err(|error| error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct RecordingPages {
        pages: Vec<Result<String, String>>,
        requested: RefCell<Vec<u32>>,
    }

    impl RecordingPages {
        fn new(pages: Vec<Result<String, String>>) -> Self {
            Self {
                pages,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for RecordingPages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, page_number: u32) -> Result<String, String> {
            self.requested.borrow_mut().push(page_number);
            self.pages[page_number as usize - 1].clone()
        }
    }

    #[test]
    fn seven_page_document_reads_only_first_five() {
        let source = RecordingPages::new((1..=7).map(|n| Ok(format!("p{n} "))).collect());

        let text = first_pages_text(&source);

        assert_eq!(text, "p1 p2 p3 p4 p5 ");
        assert_eq!(*source.requested.borrow(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn unreadable_page_contributes_empty_text() {
        let source = RecordingPages::new(vec![
            Ok("intro".to_string()),
            Err("no text operators".to_string()),
            Ok("end".to_string()),
        ]);

        assert_eq!(first_pages_text(&source), "introend");
    }

    struct PanickingPage;

    impl PageSource for PanickingPage {
        fn page_count(&self) -> usize {
            2
        }

        fn page_text(&self, page_number: u32) -> Result<String, String> {
            if page_number == 1 {
                panic!("Encoding should be only retrieved from Font type dictionaries!");
            }
            Ok("second".to_string())
        }
    }

    #[test]
    fn page_that_panics_is_skipped() {
        assert_eq!(first_pages_text(&PanickingPage), "second");
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        assert!(LopdfPages::load(b"%PDF-1.5 not really").is_err());
    }

    #[test]
    fn empty_document_yields_empty_text() {
        let source = RecordingPages::new(Vec::new());

        assert_eq!(first_pages_text(&source), "");
        assert!(source.requested.borrow().is_empty());
    }
}
