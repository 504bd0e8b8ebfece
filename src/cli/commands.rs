use crate::app::{AppContext, HnError, Result};
use crate::domain::{page, ForumItem, ItemId, StoryFilter};

pub async fn show_item(ctx: &AppContext, id: ItemId) -> Result<()> {
    let item = ctx
        .items
        .get_item(Some(id))
        .await
        .into_result()?
        .ok_or_else(|| HnError::NotFound(format!("item {}", id)))?;

    print_item(&item);

    let text = item.display_text();
    if !text.is_empty() {
        println!();
        println!("{}", text);
    }
    if !item.kids().is_empty() {
        println!();
        println!("{} replies", item.kids().len());
    }
    Ok(())
}

pub async fn show_user(ctx: &AppContext, username: &str) -> Result<()> {
    let user = ctx
        .items
        .get_user(Some(username))
        .await
        .into_result()?
        .ok_or_else(|| HnError::NotFound(format!("user {}", username)))?;

    println!("{} ({} karma)", user.id, user.karma);
    if let Some(created) = user.created_at() {
        println!("Joined {}", created.format("%Y-%m-%d"));
    }
    if let Some(about) = &user.about {
        println!("{}", html_escape::decode_html_entities(about));
    }
    println!("{} submissions", user.submitted.len());
    Ok(())
}

pub async fn list_stories(
    ctx: &AppContext,
    filter: StoryFilter,
    offset: usize,
    limit: usize,
) -> Result<()> {
    let ids = ctx
        .items
        .get_story_ids(filter)
        .await
        .into_result()?
        .unwrap_or_default();

    let slice = page(&ids, offset, limit);
    if slice.is_empty() {
        println!("No stories");
        return Ok(());
    }

    let mut errors = 0;
    for (rank, (id, result)) in ctx.loader.load_items(&slice).await.into_iter().enumerate() {
        match result.into_result() {
            Ok(Some(item)) => {
                print!("{:>3}. ", offset + rank + 1);
                print_item(&item);
            }
            Ok(None) => {}
            Err(e) => {
                errors += 1;
                eprintln!("  Error loading {}: {}", id, e);
            }
        }
    }

    if errors > 0 {
        eprintln!("{} of {} stories failed to load", errors, slice.len());
    }
    Ok(())
}

pub async fn show_parents(ctx: &AppContext, id: ItemId) -> Result<()> {
    let item = ctx
        .items
        .get_item(Some(id))
        .await
        .into_result()?
        .ok_or_else(|| HnError::NotFound(format!("item {}", id)))?;

    if item.is_root() || item.parent().is_none() {
        println!("{} {} has no parents", item.kind(), id);
        return Ok(());
    }

    let ancestry = ctx
        .ancestors
        .resolve(item.parent())
        .await
        .into_result()?
        .ok_or_else(|| HnError::NotFound(format!("parents of {}", id)))?;

    for (depth, ancestor) in ancestry.items().iter().enumerate() {
        print!("{}", "  ".repeat(depth));
        print_item(ancestor);
    }
    print!("{}", "  ".repeat(ancestry.len()));
    print_item(&item);
    Ok(())
}

pub async fn show_metadata(ctx: &AppContext, url: &str) -> Result<()> {
    let metadata = ctx.metadata.extract(Some(url)).await;

    if metadata.is_empty() {
        println!("No metadata available for {}", url);
        return Ok(());
    }

    println!("Favicon:     {}", metadata.favicon.as_deref().unwrap_or("-"));
    println!("Image:       {}", metadata.image.as_deref().unwrap_or("-"));
    println!(
        "Application: {}",
        metadata.application_name.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn print_item(item: &ForumItem) {
    let fields = item.fields();
    let by = fields.by.as_deref().unwrap_or("[deleted]");

    match item {
        ForumItem::Comment(_) => {
            let text = item.display_text();
            let preview: String = text.chars().take(72).collect();
            println!("[{}] comment by {}: {}", item.id(), by, preview);
        }
        _ => {
            let link = item.url().map(|u| format!(" <{}>", u)).unwrap_or_default();
            println!(
                "[{}] {} by {} ({} points){}",
                item.id(),
                item.display_title(),
                by,
                fields.score.unwrap_or(0),
                link
            );
        }
    }
}
