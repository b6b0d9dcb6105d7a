use std::io::{self, BufRead, Write};

use crate::db::ArticleStore;
use crate::error::{AppError, Result};
use crate::models::{display_name, Article, ArticleStatus, FieldEdit, ReviewEdits, CATEGORIES};

use super::ReviewCommand;

// Review is human-paced; one screenful of backlog per session is plenty.
const REVIEW_BATCH: usize = 200;

/// Walk the pending queue oldest-first, reading one decision per article
/// from stdin.
pub async fn run_review_console(store: &ArticleStore) -> Result<()> {
    let pending = store
        .list_by_status(ArticleStatus::AnnotatedPendingReview, REVIEW_BATCH)
        .await?;
    if pending.is_empty() {
        println!("Nothing awaiting review.");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let total = pending.len();

    for (idx, article) in pending.into_iter().enumerate() {
        println!("\n[{}/{}]", idx + 1, total);
        print_article(&article);

        loop {
            let Some(input) = prompt(&mut lines, "[a]pprove [e]dit [r]eject [s]kip [d]elete [q]uit > ")?
            else {
                return Ok(());
            };

            match input.as_str() {
                "a" => {
                    ReviewCommand::Approve { url: article.url.clone() }
                        .apply(store)
                        .await?;
                    println!("approved");
                    break;
                }
                "e" => {
                    edit_flow(store, &article, &mut lines).await?;
                    break;
                }
                "r" => {
                    ReviewCommand::Reject { url: article.url.clone() }
                        .apply(store)
                        .await?;
                    println!("rejected");
                    break;
                }
                "s" | "" => {
                    ReviewCommand::Skip { url: article.url.clone() }
                        .apply(store)
                        .await?;
                    break;
                }
                "d" => {
                    ReviewCommand::Delete { url: article.url.clone() }
                        .apply(store)
                        .await?;
                    println!("deleted");
                    break;
                }
                "q" => return Ok(()),
                _ => println!("unrecognized choice"),
            }
        }
    }

    Ok(())
}

fn print_article(article: &Article) {
    println!("url:      {}", article.url);
    if let Some(title) = &article.title {
        println!("title:    {title}");
    }
    if let Some(date) = article.date {
        println!("date:     {date}");
    }
    if let Some(category) = &article.category {
        println!("category: {}", display_name(category));
    }
    if let Some(summary) = &article.summary {
        println!("summary:  {summary}");
    }
    if let Some(note) = &article.review_note {
        println!("note:     {note}");
    }
}

/// Gather field edits, then save (with or without approval). An invalid
/// category re-prompts just that field; the other edits are kept.
async fn edit_flow(
    store: &ArticleStore,
    article: &Article,
    lines: &mut io::Lines<io::StdinLock<'_>>,
) -> Result<()> {
    println!("enter = keep current, '-' = clear");

    let Some(title) = prompt(lines, "title: ")? else { return Ok(()) };
    println!("categories: {}", CATEGORIES.join(" "));
    let Some(category) = prompt(lines, "category: ")? else { return Ok(()) };
    let Some(summary) = prompt(lines, "summary: ")? else { return Ok(()) };
    let Some(note) = prompt(lines, "note: ")? else { return Ok(()) };

    let mut edits = ReviewEdits {
        title: parse_edit(&title),
        category: parse_edit(&category),
        summary: parse_edit(&summary),
        review_note: parse_edit(&note),
    };
    if edits.is_noop() {
        println!("no changes");
    }

    let approve = loop {
        let Some(action) = prompt(lines, "[s]ave / save and [a]pprove > ")? else {
            return Ok(());
        };
        match action.as_str() {
            "s" => break false,
            "a" => break true,
            _ => println!("unrecognized choice"),
        }
    };

    loop {
        let command = if approve {
            ReviewCommand::EditAndApprove {
                url: article.url.clone(),
                edits: edits.clone(),
            }
        } else {
            ReviewCommand::Edit {
                url: article.url.clone(),
                edits: edits.clone(),
            }
        };

        match command.apply(store).await {
            Ok(()) => {
                println!("saved");
                return Ok(());
            }
            Err(AppError::InvalidCategory(bad)) => {
                // Keep the rest of the edit; only the category was wrong.
                println!("'{bad}' is not in the taxonomy: {}", CATEGORIES.join(" "));
                let Some(category) = prompt(lines, "category: ")? else { return Ok(()) };
                edits.category = parse_edit(&category);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Map console input to an edit sentinel: empty keeps the stored value,
/// a lone '-' clears it, anything else replaces it.
fn parse_edit(input: &str) -> FieldEdit {
    match input.trim() {
        "" => FieldEdit::Keep,
        "-" => FieldEdit::Clear,
        value => FieldEdit::Set(value.to_string()),
    }
}

fn prompt(
    lines: &mut io::Lines<io::StdinLock<'_>>,
    message: &str,
) -> Result<Option<String>> {
    print!("{message}");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}
