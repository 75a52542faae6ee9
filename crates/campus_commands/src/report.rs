use campus_db::roster::SectionStats;
use itertools::Itertools;

const HEADERS: [&str; 4] = ["Section", "Joined", "Remaining", "Verified"];

/// Render per-section stats of a batch as a grid table, with a trailing `Total` row.
///
/// Separators between sections of the same family (ex. `CS-A` and `CS-B`) are dropped,
/// as is the one above the totals. Returns `None` when there is nothing to report.
pub fn format_section_report(sections: &[SectionStats]) -> Option<String> {
    if sections.is_empty() {
        return None;
    }

    let total = SectionStats {
        section: "Total".to_string(),
        joined: sections.iter().map(|s| s.joined).sum(),
        remaining: sections.iter().map(|s| s.remaining).sum(),
        verified: sections.iter().map(|s| s.verified).sum(),
    };
    let rows = sections
        .iter()
        .chain(std::iter::once(&total))
        .map(|s| {
            [
                s.section.clone(),
                s.joined.to_string(),
                s.remaining.to_string(),
                s.verified.to_string(),
            ]
        })
        .collect_vec();

    let mut lines = render_grid(&rows);
    lines[2] = lines[0].clone();

    for (deleted, index) in separator_deletions(sections).into_iter().enumerate() {
        lines.remove(index - deleted);
    }
    Some(lines.join("\n"))
}

/// Line indices of the separators to drop, relative to the unmodified grid.
///
/// Row `k` of the grid sits on line `3 + 2k` and is followed by a separator on line `4 + 2k`.
/// A row of the same family as the previous one marks its own trailing separator,
/// while a new family pushes the last mark down to the separator after itself.
fn separator_deletions(sections: &[SectionStats]) -> Vec<usize> {
    let mut indices: Vec<usize> = Vec::new();
    let mut previous = match sections.first() {
        Some(first) => family(&first.section),
        None => return indices,
    };
    for (k, section) in sections.iter().enumerate() {
        let current = family(&section.section);
        if current == previous {
            indices.push(4 + 2 * k);
        } else if let Some(last) = indices.last_mut() {
            *last += 2;
        }
        previous = current;
    }
    indices
}

fn family(section: &str) -> &str {
    match section.char_indices().nth(2) {
        Some((idx, _)) => &section[..idx],
        None => section,
    }
}

fn render_grid(rows: &[[String; 4]]) -> Vec<String> {
    let widths = (0..HEADERS.len())
        .map(|col| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(HEADERS[col].len() + 2))
                .max()
                .unwrap_or_default()
        })
        .collect_vec();

    let border = format!(
        "+{}+",
        widths.iter().map(|w| "-".repeat(w + 2)).join("+")
    );
    let header_separator = format!(
        "+{}+",
        widths.iter().map(|w| "=".repeat(w + 2)).join("+")
    );
    let render_row = |cells: &[&str]| {
        let cells = cells
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(col, (cell, width))| {
                // the first column holds the section names, everything else is numeric
                if col == 0 {
                    format!(" {:<width$} ", cell, width = width)
                } else {
                    format!(" {:>width$} ", cell, width = width)
                }
            })
            .join("|");
        format!("|{}|", cells)
    };

    let mut lines = vec![border.clone(), render_row(&HEADERS), header_separator];
    for row in rows {
        let cells = row.iter().map(String::as_str).collect_vec();
        lines.push(render_row(&cells));
        lines.push(border.clone());
    }
    lines
}

#[cfg(test)]
mod test {
    use indoc::indoc;

    use super::*;

    fn stats(section: &str, joined: i64, remaining: i64, verified: i64) -> SectionStats {
        SectionStats {
            section: section.to_string(),
            joined,
            remaining,
            verified,
        }
    }

    #[test]
    fn report_groups_section_families() {
        let report = format_section_report(&[
            stats("CS-A", 10, 2, 8),
            stats("CS-B", 5, 1, 4),
            stats("EE-A", 3, 0, 3),
        ])
        .unwrap();
        assert_eq!(
            report,
            indoc! {"
                +-----------+----------+-------------+------------+
                | Section   |   Joined |   Remaining |   Verified |
                +-----------+----------+-------------+------------+
                | CS-A      |       10 |           2 |          8 |
                | CS-B      |        5 |           1 |          4 |
                +-----------+----------+-------------+------------+
                | EE-A      |        3 |           0 |          3 |
                | Total     |       18 |           3 |         15 |
                +-----------+----------+-------------+------------+"}
        );
    }

    #[test]
    fn single_section_report() {
        let report = format_section_report(&[stats("ME-A", 1234567890, 0, 7)]).unwrap();
        assert_eq!(
            report,
            indoc! {"
                +-----------+------------+-------------+------------+
                | Section   |     Joined |   Remaining |   Verified |
                +-----------+------------+-------------+------------+
                | ME-A      | 1234567890 |           0 |          7 |
                | Total     | 1234567890 |           0 |          7 |
                +-----------+------------+-------------+------------+"}
        );
    }

    #[test]
    fn separator_deletion_indices() {
        let sections = [
            stats("CS-A", 0, 0, 0),
            stats("CS-B", 0, 0, 0),
            stats("EE-A", 0, 0, 0),
            stats("EE-B", 0, 0, 0),
            stats("ME-A", 0, 0, 0),
        ];
        assert_eq!(separator_deletions(&sections), vec![4, 8, 12]);
        assert_eq!(separator_deletions(&sections[..1]), vec![4]);
        assert!(separator_deletions(&[]).is_empty());
    }

    #[test]
    fn every_section_its_own_family() {
        let report = format_section_report(&[stats("CS-A", 1, 0, 1), stats("EE-A", 2, 1, 0)]).unwrap();
        let lines = report.lines().collect_vec();
        assert_eq!(lines.len(), 8);
        assert!(lines[3].starts_with("| CS-A"));
        assert!(lines[4].starts_with("+---"));
        assert!(lines[5].starts_with("| EE-A"));
        assert!(lines[6].starts_with("| Total"));
    }

    #[test]
    fn empty_report() {
        assert_eq!(format_section_report(&[]), None);
    }
}
