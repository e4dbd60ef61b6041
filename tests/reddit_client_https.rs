use futures::StreamExt;
use snoocore::reddit::Client;
use snoocore::stream::StreamConfig;
use snoocore::thing::{Comment, Fullname, Submission, Thing};

// These talk to the live Reddit API, so they need a registered script app
// in $REDDIT_CLIENT_ID, $REDDIT_CLIENT_SECRET, $REDDIT_USERNAME, and
// $REDDIT_PASSWORD. Reddit's data changes constantly, so they mostly check
// that requests authenticate and that responses hydrate.

fn client() -> Client {
    Client::from_env().expect("Reddit credentials are not defined")
}

#[tokio::test]
#[ignore = "requires Reddit credentials"]
async fn it_retrieves_the_authenticated_user() {
    let client = client();
    let me = client.me().await.expect("could not fetch authenticated user");
    assert!(!me.username().is_empty());
    assert!(me.fullname().parse::<Fullname>().is_ok());
}

#[tokio::test]
#[ignore = "requires Reddit credentials"]
async fn it_retrieves_profiles() {
    let user = client().user("mipadi").await.expect("could not fetch user");
    assert_eq!(user.username(), "mipadi");
}

#[tokio::test]
#[ignore = "requires Reddit credentials"]
async fn it_pages_through_comments() {
    let user = client().user("mipadi").await.expect("could not fetch user");
    let comments = user.comments().collect(150).await.expect("could not fetch comments");
    assert!(comments.len() > 100);
}

#[tokio::test]
#[ignore = "requires Reddit credentials"]
async fn it_streams_new_posts() {
    let subreddit = client().subreddit("rust").await.expect("could not fetch subreddit");
    let stream = subreddit.stream::<Submission>("new", StreamConfig::default());
    let posts: Vec<_> = Box::pin(stream).take(5).collect().await;
    assert_eq!(posts.len(), 5);
    assert!(posts.iter().all(Result::is_ok));
}

#[tokio::test]
#[ignore = "requires Reddit credentials"]
async fn it_loads_comment_trees() {
    let subreddit = client().subreddit("rust").await.expect("could not fetch subreddit");
    let comments = subreddit.comments().collect(1).await.expect("could not fetch comments");
    let comment: &Comment = comments.first().expect("r/rust has no comments");
    assert!(comment.link_id().starts_with("t3_"));
}
