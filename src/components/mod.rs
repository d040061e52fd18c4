pub mod bayes_net;
