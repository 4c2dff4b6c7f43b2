//! Greets the `name` of the event.
//!
//! ```text
//! $ echo '{"name": "world"}' | cargo run --example hello
//! {"message":"Hello, world!","functionName":"unknown","requestId":"unknown"}
//! ```

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Greeting {
    message: String,
    function_name: String,
    request_id: String,
}

pub fn main() {
    if let Err(err) = invocation_shim::init_logging(log::LevelFilter::Info) {
        eprintln!("Unable to setup logging: {:?}", err);
    }

    let handler = invocation_shim::handler_fn(
        |event: serde_json::Value, context: invocation_shim::Context| async move {
            let name = event["name"].as_str().unwrap_or("Anonymous");
            Ok::<_, anyhow::Error>(Greeting {
                message: format!("Hello, {}!", name),
                function_name: context.function_name,
                request_id: context.request_id,
            })
        },
    );

    if let Err(err) = invocation_shim::exec_tokio(handler, invocation_shim::Options::default()) {
        eprint!("{}", err.report());
        std::process::exit(err.exit_code());
    }
}
