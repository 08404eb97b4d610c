// Few-shot prompt assembly

use std::fmt::Write;

use crate::data::ExamplePair;

const PREAMBLE: &str = "You are an expert in transliterating Tamil text to Arwi script.\n\
Don't add any sentence before or after the output text.\n\
Here are a few examples:\n";

const QUERY_HEADER: &str = "Now, transliterate the following Tamil text to Arwi:\n";

/// Format one example line
pub fn example_line(pair: &ExamplePair) -> String {
    format!("Tamil: {}, Arwi: {}", pair.source_text, pair.target_text)
}

/// Build the prompt: instructions, one line per example in order, then the query.
pub fn build_prompt(examples: &[ExamplePair], input: &str) -> String {
    let mut prompt = String::from(PREAMBLE);
    for pair in examples {
        // Writing to a String cannot fail.
        let _ = writeln!(prompt, "{}", example_line(pair));
    }
    prompt.push('\n');
    prompt.push_str(QUERY_HEADER);
    let _ = write!(prompt, "Tamil: {} Arwi:", input);
    prompt
}
