use anyhow::{Context, Result};
use colloquy::news::{extract_articles, NewsClient, NewsQuery};
use serde_json::Value;

use crate::configuration::NewsSettings;

#[derive(Debug, Default)]
pub struct NewsOptions {
    pub api_key: Option<String>,
    pub tickers: Option<String>,
    pub topics: Option<String>,
    pub limit: Option<usize>,
}

pub async fn execute(settings: NewsSettings, options: NewsOptions) -> Result<()> {
    let articles = fetch_articles(settings, options).await?;
    println!("{}", serde_json::to_string_pretty(&articles)?);
    Ok(())
}

/// Fetch the feed and keep at most `limit` articles
pub async fn fetch_articles(settings: NewsSettings, options: NewsOptions) -> Result<Vec<Value>> {
    let api_key = options
        .api_key
        .or_else(|| settings.api_key.clone())
        .context("API key must be provided via --apikey or COLLOQUY_NEWS__API_KEY")?;
    let limit = options.limit.unwrap_or(settings.limit);

    let client = NewsClient::new(settings.into_config(api_key))?;
    let query = NewsQuery::from_csv(options.tickers.as_deref(), options.topics.as_deref());

    let data = client
        .fetch_news_sentiment(&query)
        .await
        .context("Failed to fetch news")?;

    let mut articles = extract_articles(&data);
    articles.truncate(limit);
    Ok(articles)
}
