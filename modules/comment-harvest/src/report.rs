//! Human-readable summaries printed at the end of a run.

use std::fmt;

use harvest_common::ItemKind;

use crate::pipeline::stats::RunResult;
use crate::sources::ItemGroup;

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Comment Harvest Complete ===")?;
        writeln!(f, "Run:            {}", self.run_id)?;
        writeln!(f, "Items:          {}", self.total_items)?;
        writeln!(f, "Succeeded:      {}", self.succeeded)?;
        writeln!(f, "Failed:         {}", self.failed)?;
        writeln!(f, "Success rate:   {:.1}%", self.success_rate())?;
        writeln!(f, "Comments:       {}", self.total_records)?;
        writeln!(f, "Elapsed:        {}s", self.elapsed().num_seconds())?;
        writeln!(f, "Log:            {}", self.log_file.display())?;

        if self.is_grouped() {
            writeln!(f, "\nBy group:")?;
            for group in &self.groups {
                writeln!(
                    f,
                    "  {}: {}/{} items, {} comments",
                    group.group_label, group.succeeded, group.total_items, group.total_records
                )?;
                match (&group.output_file, &group.persist_error) {
                    (Some(path), _) => writeln!(f, "    -> {}", path.display())?,
                    (None, Some(err)) => writeln!(f, "    !! write failed: {err}")?,
                    (None, None) => {}
                }
            }
        } else if !self.item_outputs.is_empty() {
            writeln!(f, "\nFiles written:  {}", self.item_outputs.len())?;
        }

        if !self.failed_items.is_empty() {
            writeln!(f, "\nFailed items:")?;
            for item in &self.failed_items {
                writeln!(f, "  - {} ({})", item.title, item.url)?;
            }
        }
        Ok(())
    }
}

/// Per-keyword breakdown of a discovery pass.
pub struct DiscoverySummary<'a>(pub &'a [ItemGroup]);

impl fmt::Display for DiscoverySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Discovery Summary ===")?;
        let mut total = 0;
        for group in self.0 {
            let short_form = group
                .items
                .iter()
                .filter(|i| i.kind == ItemKind::ShortForm)
                .count();
            let primary = group.items.len() - short_form;
            total += group.items.len();
            writeln!(
                f,
                "{}: {} items ({} primary, {} short-form)",
                group.label,
                group.items.len(),
                primary,
                short_form
            )?;
        }
        writeln!(f, "Total: {} items in {} groups", total, self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_common::ItemReference;

    #[test]
    fn discovery_summary_counts_kinds() {
        let groups = vec![
            ItemGroup::new(
                "cats",
                vec![
                    ItemReference::from_url("https://www.youtube.com/watch?v=a", 1, "cats"),
                    ItemReference::from_url("https://www.youtube.com/shorts/b", 2, "cats"),
                    ItemReference::from_url("https://www.youtube.com/shorts/c", 3, "cats"),
                ],
            ),
            ItemGroup::new("dogs", vec![]),
        ];

        let text = DiscoverySummary(&groups).to_string();
        assert!(text.contains("cats: 3 items (1 primary, 2 short-form)"));
        assert!(text.contains("dogs: 0 items (0 primary, 0 short-form)"));
        assert!(text.contains("Total: 3 items in 2 groups"));
    }
}
