use std::time::{SystemTime, UNIX_EPOCH};

use cloudcraft_http::{
    Blueprint, BlueprintData, BudgetExportParams, CloudcraftClient, CloudcraftError, Config,
    ImageExportParams,
};

fn live_client() -> Option<CloudcraftClient> {
    let config = Config::from_env();
    if config.key.is_empty() {
        return None;
    }
    Some(CloudcraftClient::new(config).expect("CLOUDCRAFT_* env must form a valid config"))
}

fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock must be after epoch")
        .as_millis()
}

#[tokio::test]
async fn live_blueprint_lifecycle() {
    let Some(client) = live_client() else {
        eprintln!("skipping live test: CLOUDCRAFT_API_KEY is not set");
        return;
    };

    let me = client.users().me().await.expect("user lookup must succeed");
    assert!(!me.id.is_empty());

    let name = format!("live-test-{}", unique_suffix());
    let created = client
        .blueprints()
        .create(&Blueprint {
            data: Some(BlueprintData {
                name: name.clone(),
                grid: "standard".to_owned(),
                ..BlueprintData::default()
            }),
            ..Blueprint::default()
        })
        .await
        .expect("create must succeed");
    assert!(!created.id.is_empty());

    let (mut fetched, etag) = client
        .blueprints()
        .get_with_etag(&created.id)
        .await
        .expect("get must succeed");
    if let Some(data) = fetched.data.as_mut() {
        data.name = format!("{name}-renamed");
    }
    client
        .blueprints()
        .update(&fetched, etag.as_deref())
        .await
        .expect("conditional update must succeed");

    let png = client
        .blueprints()
        .export_image(&created.id, "png", &ImageExportParams::default())
        .await
        .expect("image export must succeed");
    assert!(png.body.starts_with(b"\x89PNG"));

    client
        .blueprints()
        .export_budget(&created.id, "csv", &BudgetExportParams::default())
        .await
        .expect("budget export must succeed");

    client
        .blueprints()
        .delete(&created.id)
        .await
        .expect("delete must succeed");

    let err = client
        .blueprints()
        .get(&created.id)
        .await
        .expect_err("deleted blueprint must be gone");
    assert!(matches!(err, CloudcraftError::RequestFailed { status: 404 }));
}
