//! Prompt construction for the text-generation endpoint. One theme per
//! question, each anchored to the option that currently leads its poll.

use crate::models::{QuestionTally, Story};

// Short exemplar showing the expected shape: a title line, then sections
// wrapped in the double-star marker
const STYLE_GUIDE: &str = "\
The Library at Dusk
**Arrival:**
The reading room empties slowly, one lamp at a time, until only the long tables remain lit.
Latecomers claim the corner desks and unpack in practiced silence.
**Closing:**
By the last bell the shelves have been straightened and the day's requests reshelved.
";

// Marks the end of the instructions; the completion is read from after it
pub const COMPLETION_DELIMITER: &str = "###";

pub fn build_prompt(story: &Story, tallies: &[QuestionTally]) -> String {
    let mut prompt = format!(
        "Imagine you are giving an expository essay about {} {}. A guide is provided below, \
         but yours should be on the level of a linguistics professor, targeted to be read by \
         the whole university community. The essay should be titled {}. Focus on the following \
         themes and strictly adhere to the mainpoint provided for each theme, with each \
         developed into a single paragraph.\n\nGuide:\n{}\n",
        story.title, story.description, story.title, STYLE_GUIDE
    );

    for (number, tally) in tallies.iter().enumerate() {
        let mainpoint = tally.leading_option().unwrap_or("");
        prompt.push_str(&format!(
            "\n{}. Theme: {}\n   - mainpoint: {}\n",
            number + 1,
            tally.question,
            mainpoint
        ));
    }

    prompt.push_str(&format!(
        "\nNow generate the expository essay of {} paragraphs max, each one representing a \
         theme. Ensure that the essay is well structured and coherent, with the title on the \
         first line and each section title wrapped in a double star symbol.\n{}\n",
        tallies.len(),
        COMPLETION_DELIMITER
    ));

    prompt
}
