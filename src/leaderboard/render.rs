use super::Leaderboard;

/// Spaces between the name and score columns
const COLUMN_PADDING: usize = 3;

impl Leaderboard {
    /// Column-aligned text for posting in chat
    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!("No respec yet ({})\n", self.scope.label());
        }

        let mut out = String::new();
        let name_width = self
            .top
            .iter()
            .map(|e| e.name.chars().count())
            .max()
            .unwrap_or(0);

        for entry in &self.top {
            let pad = name_width - entry.name.chars().count() + COLUMN_PADDING;
            out.push_str(&format!("{}{}{}\n", entry.name, " ".repeat(pad), entry.score));
        }

        if !self.negative.is_empty() {
            out.push_str(&format!("Negative respec: {}\n", self.negative.join(", ")));
        }
        out
    }
}
