use anyhow::Result;
use interview_quiz_cleaner::models::Category;
use interview_quiz_cleaner::utils::logging;
use interview_quiz_cleaner::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let mut config = Config::from_env()?;

    // 命令行参数可覆盖要处理的分类，例如 `javascript,css`
    if let Some(raw) = std::env::args().nth(1) {
        config.categories = Category::parse_list(&raw)?;
    }

    // 初始化并运行应用
    let summary = App::initialize(config).await?.run().await?;

    if !summary.success {
        anyhow::bail!("所有分类都未能生成题目");
    }

    Ok(())
}
