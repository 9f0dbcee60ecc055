use criticore::{BuiltinModel, ModelManager, Scorer, ScorerError};

async fn setup_scorer() -> Result<Scorer, Box<dyn std::error::Error>> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::CamembertCriticality;

    if !manager.is_model_downloaded(model) {
        manager.download_model(model).await?;
    }
    assert!(manager.is_model_downloaded(model));

    let scorer = Scorer::builder().with_model(model)?.build()?;
    Ok(scorer)
}

#[tokio::test]
async fn test_scores_are_bounded_and_consistent() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let scores = scorer.predict("fuite d'huile importante sur la pompe P-101")?;

    assert!(scores.fiabilite_integrite <= 5);
    assert!(scores.disponibilite <= 5);
    assert!(scores.process_safety <= 5);
    assert_eq!(
        scores.criticite,
        scores.fiabilite_integrite + scores.disponibilite + scores.process_safety
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_text_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    assert!(matches!(
        scorer.predict(""),
        Err(ScorerError::ValidationError(_))
    ));
    assert!(matches!(
        scorer.predict("   \t\n"),
        Err(ScorerError::ValidationError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_long_text_is_truncated_not_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let long_text = "vibration anormale détectée sur le palier ".repeat(200);
    let scores = scorer.predict(&long_text)?;
    assert!(scores.criticite <= 15);
    Ok(())
}

#[tokio::test]
async fn test_prediction_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let text = "corrosion avancée de la tuyauterie vapeur";
    assert_eq!(scorer.predict(text)?, scorer.predict(text)?);
    Ok(())
}

#[tokio::test]
async fn test_case_and_spacing_do_not_change_scores() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let a = scorer.predict("Fuite vapeur  sur la chaudière B")?;
    let b = scorer.predict("fuite vapeur sur la chaudière b")?;
    assert_eq!(a, b);
    Ok(())
}

#[tokio::test]
async fn test_batch_skips_blank_entries() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let texts = vec![
        "surchauffe du moteur de ventilation".to_string(),
        "   ".to_string(),
        "défaut capteur de température".to_string(),
    ];
    let results = scorer.predict_batch(&texts)?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, texts[0]);
    assert_eq!(results[1].0, texts[2]);
    Ok(())
}

#[tokio::test]
async fn test_info_reports_configuration() -> Result<(), Box<dyn std::error::Error>> {
    let scorer = setup_scorer().await?;
    let info = scorer.info();
    assert_eq!(info.num_tasks, 3);
    assert_eq!(info.num_classes, 6);
    assert!(info.model_path.ends_with("model.onnx"));
    Ok(())
}
