#[cfg(feature = "lambda")]
use coffee_protocol::core::submission::{FunctionEvent, FunctionResponse, HandlerRequest, SubmissionHandler};
#[cfg(feature = "lambda")]
use coffee_protocol::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use coffee_protocol::{HandlerEnv, NotionClient};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

#[cfg(feature = "lambda")]
async fn function_handler(
    handler: &SubmissionHandler<NotionClient>,
    event: LambdaEvent<FunctionEvent>,
) -> Result<FunctionResponse, Error> {
    tracing::info!("Handling {} request", event.payload.http_method);

    let response = handler.handle(HandlerRequest::from(event.payload)).await;

    tracing::info!("Responding with status {}", response.status);
    Ok(FunctionResponse::from(response))
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 憑證缺失時不中止，每個請求會回傳 500
    let env = HandlerEnv::from_env();
    env.validate()?;
    tracing::info!("Handler environment: {:?}", env);

    let client = NotionClient::from_env(&env)?;
    let handler = SubmissionHandler::new(client, env);
    let handler = &handler;

    run(service_fn(move |event: LambdaEvent<FunctionEvent>| async move {
        function_handler(handler, event).await
    }))
    .await
}
