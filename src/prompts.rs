//! The extraction question sent with every document.
//!
//! The question text is part of the cache fingerprint: edit a single
//! character here and every previously cached answer becomes a miss. Treat
//! changes as a (deliberate, budgeted) full re-run of the corpus.
//!
//! The reconstructed document text is appended directly after the template
//! (which therefore ends with `CONTEXT:` and a blank line).

/// Question template for credit-card agreement field extraction.
///
/// Asks for a fixed JSON schema; each field defaults to an empty string when
/// the answer is not present in the context.
pub const AGREEMENT_QUESTION: &str = r#"
You have been tasked to extract information from a consumer credit card agreement. You will find the entire text of the agreement after the word "CONTEXT:" at the end of this message.

Follow these general instructions:

1. Please only answer the question using the provided context.
2. Note that the text is based on an OCRed scan, so it might contain typos typical of OCRed documents.
3. Provide your response using JSON fields. If a given item is not found, return an empty string.

Your objective is to extract information about the credit card agreement. Provide the solution as follows:

{
    "bank_name": "...", # Name of the bank or financial institution
    "product_name": "...", # Name of the credit card product
    "card_network": "...", # Type of card (Visa, Mastercard, Amex, etc.)
    "gambling_prohibited": "...", # Does the agreement prohibit gambling or betting transactions? Respond "yes", "no", or "depends"
    "gambling_snippet": "..." # Please quote the specific section (if any) discussing gambling or betting transactions
}

CONTEXT:

"#;

/// The schema fields every answer is expected to carry.
pub const ANSWER_FIELDS: [&str; 5] = [
    "bank_name",
    "product_name",
    "card_network",
    "gambling_prohibited",
    "gambling_snippet",
];
