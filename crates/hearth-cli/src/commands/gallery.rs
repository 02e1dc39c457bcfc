use std::collections::BTreeSet;

use anyhow::Result;
use colored::Colorize;
use hearth_core::gallery::GalleryTab;

use super::display::print_gallery_item;
use crate::GalleryAction;
use crate::context::AppContext;

pub async fn run(ctx: &AppContext, action: GalleryAction) -> Result<()> {
    match action {
        GalleryAction::List { uploaded, tag } => {
            let tab = if uploaded {
                GalleryTab::Uploaded
            } else {
                GalleryTab::Generated
            };
            let index = ctx.session.gallery().await;
            let items = index.view(tab, tag.as_deref());
            if items.is_empty() {
                println!("{}", "No images.".bright_black());
            }
            items.into_iter().for_each(print_gallery_item);
        }
        GalleryAction::Tags => {
            for tag in ctx.session.gallery().await.all_tags() {
                println!("#{}", tag);
            }
        }
        GalleryAction::Tag { id, tags } => {
            let stored = ctx.session.update_image_tags(&id, tags).await?;
            println!("{}", format!("Tags: {}", stored.join(", ")).bright_black());
        }
        GalleryAction::Export {
            ids,
            all,
            uploaded,
            tag,
            ..
        } => {
            if all {
                let tab = if uploaded {
                    GalleryTab::Uploaded
                } else {
                    GalleryTab::Generated
                };
                ctx.session.select_all_visible(tab, tag.as_deref()).await;
            }
            let selected: BTreeSet<String> = ctx.session.gallery_selection().await.into_iter().collect();
            let ids: BTreeSet<String> = ids.into_iter().collect();
            for id in ids.difference(&selected) {
                ctx.session.toggle_gallery_selection(id).await?;
            }

            let count = ctx.session.gallery_selection().await.len();
            let path = ctx.session.export_selected_images().await?;
            println!("{}", format!("Exported {} image(s) to {}", count, path.display()).green());
        }
    }
    Ok(())
}
