//! CLI product browsing handlers.

use super::ListArgs;
use crate::api::ApiClient;
use crate::types::{Product, ProductFilter};

/// Handle `soko products list`.
pub async fn handle_list(client: &ApiClient, args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let filter = ProductFilter {
        search: args.search,
        category_id: args.category,
        brand_id: args.brand,
        is_featured: args.featured.then_some(true),
        page: args.page,
        limit: args.limit,
        ..Default::default()
    };
    let page = client.products(&filter).await.map_err(|e| e.display_message())?;

    if page.products.is_empty() {
        println!("No products found");
        return Ok(());
    }
    for product in &page.products {
        println!("{:>8}  {}  {}", product.id, product.name, price_label(product));
    }
    if let Some(pagination) = page.pagination {
        if let (Some(current), Some(total)) = (pagination.page, pagination.total_pages) {
            println!("page {current} of {total}");
        }
    }
    Ok(())
}

/// Handle `soko products show <id>`.
pub async fn handle_show(client: &ApiClient, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let product = client.product(id).await.map_err(|e| e.display_message())?;

    println!("{} [{}]", product.name, product.id);
    println!("   price: {}", price_label(&product));
    if let Some(description) = &product.description {
        println!("   {description}");
    }
    for line in &product.product_lines {
        println!(
            "   - {} @ {} ({} in stock)",
            line.sku.as_deref().unwrap_or("-"),
            line.current_price.as_deref().unwrap_or("-"),
            line.stock_qty.unwrap_or_default()
        );
    }
    Ok(())
}

fn price_label(product: &Product) -> String {
    let range = product.price_range;
    if range.min == range.max {
        format!("{}", range.min)
    } else {
        format!("{} - {}", range.min, range.max)
    }
}
