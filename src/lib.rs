//! Helpy Backend
//!
//! Backend for the Helpy delivery/support chat service. Exposes CRUD-style
//! REST endpoints over a hosted Supabase database, a chat endpoint that
//! forwards free-text customer messages to a language model, and an
//! escalation endpoint that posts to a Zapier webhook.
//!
//! # Architecture
//!
//! Every endpoint is a thin validation-then-passthrough wrapper around an
//! external service; the service keeps no state between requests.
//!
//! * `api` - axum router, request types and handlers
//! * `auth` - `x-api-key` middleware (enforced when `API_KEYS` is set)
//! * `store` - Supabase PostgREST client (insert / select / update / upsert)
//! * `chat` - order-lookup heuristic plus language-model fallback
//! * `notify` - outbound webhook delivery (tickets, escalations)
//! * `config` - environment configuration, loaded once at startup
//! * `error` - `AppError` and its HTTP status mapping
//!
//! # Environment Configuration
//!
//! ```bash
//! SUPABASE_URL=https://xyz.supabase.co   # required
//! SUPABASE_KEY=service-role-key          # required, server-side only
//! OPENAI_API_KEY=sk-...                  # chat fallback
//! OPENAI_MODEL=gpt-4o                    # completion model
//! OPENAI_API_BASE=https://api.openai...  # completion endpoint override
//! ZAPIER_WEBHOOK=https://hooks.zapier... # ticket + escalation webhook
//! STRIPE_SECRET=whsec_...                # payment webhook (optional)
//! MAPBOX_TOKEN=pk....                    # handed through to clients
//! API_KEYS=key1,key2                     # comma-separated; empty = open
//! HOST=0.0.0.0
//! PORT=10000
//! RUST_LOG=info
//! ```
//!
//! # API Endpoints
//!
//! | Route | Methods | Notes |
//! |---|---|---|
//! | `/` | GET | health check |
//! | `/users` | POST, GET | requires `email`, `name` |
//! | `/products` | POST, GET | GET filters by `?shop_id=` |
//! | `/orders` | POST | generates a 12-char `tracking_id` if absent |
//! | `/orders/:tracking_id` | GET | customer-facing lookup, 404 on miss |
//! | `/orders/id/:order_id/status` | PUT | requires `status` |
//! | `/messages` | POST, GET | requires `order_id`, `sender`, `content` |
//! | `/messages/order/:order_id` | GET | ordered by `created_at` |
//! | `/tickets` | POST, GET | POST fires the webhook best-effort |
//! | `/delivery_boys` | POST, GET | requires `name`, `phone` |
//! | `/assign_order` | POST | flips the delivery boy to `busy` |
//! | `/assignments/order/:order_id` | GET | |
//! | `/admin/settings` | GET, POST | atomic upsert keyed on `key` |
//! | `/webhook/stripe` | POST | signature verification pending |
//! | `/chat` | POST | digits → order lookup, else language model |
//! | `/escalate` | POST | hard 500 when no webhook is configured |
//! | `/analytics` | GET | placeholder numbers |
//!
//! # Error Handling
//!
//! Missing required fields map to 400, empty lookups to 404, any data-store
//! or upstream failure to 500 with the error text echoed in the body, and a
//! rejected api key to 401. Ticket webhook failures are logged and swallowed.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod notify;
pub mod store;
