//! Built-in knowledge base with keyword search.
//!
//! A small in-memory document set standing in for a real search index.
//! Scoring is plain keyword counting with a category boost; callers only
//! see a formatted text block, so the backing search can be swapped out
//! without touching the agents.

use crate::workflow::context::Category;

/// Number of documents returned per search.
const TOP_K: usize = 3;

/// One knowledge-base document.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: &'static str,
    pub category: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

/// In-memory document search.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self {
            documents: default_documents(),
        }
    }

    /// Search for documents relevant to a query.
    ///
    /// Returns a formatted text block of the best matches, or a fixed
    /// "no results" message; never fails.
    pub fn search(&self, query: &str, category: Option<Category>) -> String {
        let query_lower = query.to_lowercase();
        let keywords: Vec<&str> = query_lower
            .split_whitespace()
            .filter(|word| word.len() > 2)
            .collect();

        let mut scored: Vec<(usize, &Document)> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let haystack = format!("{} {}", doc.title, doc.content).to_lowercase();
                let mut score = 0usize;

                if let Some(category) = category {
                    if doc.category.contains(category.as_str()) {
                        score += 5;
                    }
                }

                for keyword in &keywords {
                    score += haystack.matches(keyword).count();
                }

                (score > 0).then_some((score, doc))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));

        if scored.is_empty() {
            return "No relevant documents found in knowledge base.".to_string();
        }

        scored
            .iter()
            .take(TOP_K)
            .enumerate()
            .map(|(i, (_, doc))| format!("[Document {}] {}\n{}", i + 1, doc.title, doc.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Fetch a document by id.
    pub fn get_document(&self, doc_id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == doc_id)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

fn default_documents() -> Vec<Document> {
    vec![
        Document {
            id: "refund-policy",
            category: "policy",
            title: "Refund Policy",
            content: "Our refund policy allows returns within 30 days of purchase.\n\
                Items must be in original condition with tags attached.\n\
                Full refund will be issued to original payment method within 5-7 business days.\n\
                Shipping costs are non-refundable unless item was defective or wrong item shipped.",
        },
        Document {
            id: "exchange-policy",
            category: "policy",
            title: "Exchange Policy",
            content: "Exchanges accepted within 30 days of purchase.\n\
                Items must be unworn and in original condition.\n\
                Free exchange shipping for defective items or wrong items shipped.\n\
                Customer pays return shipping for size/color exchanges.",
        },
        Document {
            id: "shipping-policy",
            category: "policy",
            title: "Shipping Policy",
            content: "Standard shipping: 5-7 business days ($5.99)\n\
                Express shipping: 2-3 business days ($12.99)\n\
                Free shipping on orders over $50\n\
                Tracking provided via email once shipped",
        },
        Document {
            id: "product-iphone-15-pro",
            category: "product",
            title: "iPhone 15 Pro",
            content: "iPhone 15 Pro - Premium smartphone\n\
                Price: $999\n\
                Features: A17 Pro chip, ProMotion display, 48MP camera\n\
                Colors: Natural Titanium, Blue Titanium, White Titanium, Black Titanium\n\
                Storage: 128GB, 256GB, 512GB, 1TB",
        },
        Document {
            id: "product-iphone-15",
            category: "product",
            title: "iPhone 15",
            content: "iPhone 15 - Standard model\n\
                Price: $799\n\
                Features: A16 Bionic chip, Super Retina display, 48MP camera\n\
                Colors: Pink, Yellow, Green, Blue, Black\n\
                Storage: 128GB, 256GB, 512GB",
        },
    ]
}
